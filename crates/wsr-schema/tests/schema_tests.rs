//! Schema validation tests
//!
//! Identity keys are checked before anything else happens, and defaulting
//! yields stored strings rather than unset sentinels.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use wsr_schema::{
    is_identifier, ClusterMemberResource, ClusterResource, Declaration, Ensure, RawValue,
    SchemaError,
};

const MEMBER_KEYS: [&str; 5] = ["server", "node_name", "cell", "cluster", "dmgr_profile"];

fn member_declaration() -> Declaration {
    [
        ("server", "appServer01"),
        ("node_name", "appNode01"),
        ("cell", "dmgrCell01"),
        ("cluster", "test_cluster"),
        ("dmgr_profile", "PROFILE_DMGR_01"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), RawValue::from(v)))
    .collect()
}

#[test]
fn cluster_name_with_quote_is_rejected() {
    let mut decl = Declaration::new();
    decl.insert("name".into(), "test'cluster".into());
    let err = ClusterResource::from_declaration(&decl).unwrap_err();
    match err {
        SchemaError::InvalidAttribute(e) => {
            assert_eq!(e.attribute, "name");
            assert_eq!(e.value, "test'cluster");
        }
        other => panic!("expected InvalidAttribute, got {other:?}"),
    }
}

#[test]
fn every_member_identity_key_is_validated() {
    for key in MEMBER_KEYS {
        let mut decl = member_declaration();
        decl.insert(key.to_string(), "has space".into());
        let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
        assert_eq!(err.attribute(), key);
    }
}

#[test]
fn relative_profile_base_is_rejected() {
    let mut decl = member_declaration();
    decl.insert("profile_base".into(), "profiles".into());
    let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
    assert_eq!(err.attribute(), "profile_base");
}

#[test]
fn boolean_true_normalizes_to_string() {
    let mut decl = member_declaration();
    decl.insert("jvm_run_hprof".into(), RawValue::Flag(true));
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.property("jvm_run_hprof").unwrap().value.as_str(), "true");
}

#[test]
fn undeclared_flag_yields_stored_default() {
    let member = ClusterMemberResource::from_declaration(&member_declaration()).unwrap();
    assert_eq!(member.property("jvm_run_hprof").unwrap().value.as_str(), "false");
    assert_eq!(member.property("gen_unique_ports").unwrap().value.as_str(), "true");
}

#[test]
fn quoted_generic_jvm_arguments_are_rejected() {
    let mut decl = member_declaration();
    decl.insert(
        "jvm_generic_jvm_arguments".into(),
        "-Dname=\"quoted\"".into(),
    );
    let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
    assert_eq!(err.attribute(), "jvm_generic_jvm_arguments");
}

#[test]
fn weight_with_list_delimiters_is_rejected() {
    let mut decl = member_declaration();
    decl.insert("weight".into(), "2] -memberNode evilNode [".into());
    let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
    assert_eq!(err.attribute(), "weight");

    decl.insert("weight".into(), RawValue::from("7"));
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.property("weight").unwrap().value.as_str(), "7");
}

#[test]
fn gen_unique_ports_accepts_only_booleans() {
    let mut decl = member_declaration();
    decl.insert("gen_unique_ports".into(), "yes".into());
    let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
    assert_eq!(err.attribute(), "gen_unique_ports");

    decl.insert("gen_unique_ports".into(), "true -x [".into());
    assert!(ClusterMemberResource::from_declaration(&decl).is_err());

    decl.insert("gen_unique_ports".into(), "FALSE".into());
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.property("gen_unique_ports").unwrap().value.as_str(), "false");
}

#[test]
fn run_as_principal_is_free_text() {
    let mut decl = member_declaration();
    decl.insert("runas_user".into(), "was@corp".into());
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.property("runas_user").unwrap().value.as_str(), "was@corp");

    decl.insert("runas_user".into(), "was'user".into());
    let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
    assert_eq!(err.attribute(), "runas_user");
}

#[test]
fn ensure_absent_is_parsed() {
    let mut decl = member_declaration();
    decl.insert("ensure".into(), "absent".into());
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.ensure, Ensure::Absent);

    decl.insert("ensure".into(), "stopped".into());
    assert!(ClusterMemberResource::from_declaration(&decl).is_err());
}

#[test]
fn yaml_declaration_round_trips_into_member() {
    let yaml = r"
server: appServer01
node_name: appNode01
cell: dmgrCell01
cluster: test_cluster
dmgr_profile: PROFILE_DMGR_01
jvm_maximum_heap_size: 2048
jvm_verbose_mode_jni: true
umask: '002'
";
    let decl: Declaration = serde_yaml::from_str(yaml).unwrap();
    let member = ClusterMemberResource::from_declaration(&decl).unwrap();
    assert_eq!(member.property("jvm_maximum_heap_size").unwrap().value.as_str(), "2048");
    assert_eq!(member.property("jvm_verbose_mode_jni").unwrap().value.as_str(), "true");
    assert_eq!(member.property("umask").unwrap().value.as_str(), "002");
}

proptest! {
    #[test]
    fn prop_cluster_name_accepted_iff_identifier(name in "\\PC{0,16}") {
        let mut decl = Declaration::new();
        decl.insert("name".into(), RawValue::Text(name.clone()));
        let result = ClusterResource::from_declaration(&decl);
        prop_assert_eq!(result.is_ok(), is_identifier(&name));
    }

    #[test]
    fn prop_member_key_with_foreign_char_is_rejected(
        key_idx in 0..MEMBER_KEYS.len(),
        prefix in "[a-z]{1,5}",
        bad in "[ '\"/\\\\:;\\[\\]()]",
    ) {
        let key = MEMBER_KEYS[key_idx];
        let mut decl = member_declaration();
        decl.insert(key.to_string(), RawValue::Text(format!("{prefix}{bad}")));
        let err = ClusterMemberResource::from_declaration(&decl).unwrap_err();
        prop_assert_eq!(err.attribute(), key);
    }

    #[test]
    fn prop_flags_normalize_to_lowercase_text(flag in any::<bool>()) {
        let mut decl = member_declaration();
        decl.insert("jvm_disable_jit".into(), RawValue::Flag(flag));
        let member = ClusterMemberResource::from_declaration(&decl).unwrap();
        let expected = flag.to_string();
        prop_assert_eq!(member.property("jvm_disable_jit").unwrap().value.as_str(), expected.as_str());
    }
}
