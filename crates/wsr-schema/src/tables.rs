//! Schema tables for clusters and cluster members
//!
//! Adding a manageable attribute means adding a row here; nothing in the
//! reconciler branches on attribute names.

use crate::descriptor::{AttributeDescriptor as A, PropertyPath as P, Validator};

/// Spellings accepted by `ensure`
pub const ENSURE_VALUES: &[&str] = &["present", "absent"];

const ENSURE: A = A::parameter("ensure", "Whether the resource should exist")
    .defaults_to("present")
    .validated_by(Validator::OneOf(ENSURE_VALUES));

const USER: A = A::parameter("user", "The OS user to run 'wsadmin' as")
    .defaults_to("root")
    .validated_by(Validator::Identifier);

const PROFILE_BASE: A = A::parameter(
    "profile_base",
    "Absolute path to the profile base directory, e.g. /opt/IBM/WebSphere/AppServer/profiles",
)
.validated_by(Validator::AbsolutePath);

const PROFILE: A = A::parameter(
    "profile",
    "Profile used to run wsadmin. Defaults to dmgr_profile.",
)
.validated_by(Validator::Identifier);

const DMGR_HOST: A = A::parameter("dmgr_host", "The DMGR host to connect wsadmin to")
    .validated_by(Validator::Identifier);

const WSADMIN_USER: A = A::parameter("wsadmin_user", "Username for wsadmin authentication");

const WSADMIN_PASS: A =
    A::parameter("wsadmin_pass", "Password for wsadmin authentication").sensitive();

/// Attributes of a `websphere_cluster`
pub const CLUSTER_ATTRIBUTES: &[A] = &[
    A::identity("name", "The name of the cluster"),
    ENSURE,
    USER,
    PROFILE_BASE,
    A::parameter("dmgr_profile", "The DMGR profile that owns the cluster")
        .validated_by(Validator::Identifier),
    PROFILE,
    DMGR_HOST,
    WSADMIN_USER,
    WSADMIN_PASS,
];

/// Attributes of a `websphere_cluster_member`
pub const MEMBER_ATTRIBUTES: &[A] = &[
    // identity
    A::identity("server", "The server to add to the cluster"),
    A::identity("node_name", "The node the server lives on"),
    A::identity("cell", "The cell the cluster member belongs to"),
    A::identity("cluster", "The cluster the server is a member of"),
    A::identity("dmgr_profile", "The DMGR profile to manage, e.g. PROFILE_DMGR_01"),
    // execution context
    ENSURE,
    USER,
    PROFILE_BASE,
    PROFILE,
    DMGR_HOST,
    WSADMIN_USER,
    WSADMIN_PASS,
    A::parameter("replicator_entry", "Reserved. Accepted and ignored."),
    // membership
    A::property("weight", P::cluster_member("weight"), "Cluster member weight")
        .on_create("memberWeight")
        .defaults_to("2")
        .validated_by(Validator::Digits),
    A::create_option(
        "gen_unique_ports",
        "genUniquePorts",
        "Generate unique ports when the member is created",
    )
    .defaults_to("true")
    .flag()
    .validated_by(Validator::OneOf(&["true", "false"])),
    // JVM
    A::property("jvm_maximum_heap_size", P::jvm("maximumHeapSize"), "JVM maximum heap size (MB)")
        .defaults_to("1024"),
    A::property("jvm_initial_heap_size", P::jvm("initialHeapSize"), "JVM initial heap size (MB)")
        .defaults_to("1024"),
    A::property("jvm_verbose_mode_class", P::jvm("verboseModeClass"), "Verbose class loading")
        .defaults_to("false")
        .flag(),
    A::property(
        "jvm_verbose_garbage_collection",
        P::jvm("verboseModeGarbageCollection"),
        "Verbose garbage collection",
    )
    .defaults_to("false")
    .flag(),
    A::property("jvm_verbose_mode_jni", P::jvm("verboseModeJNI"), "Verbose JNI")
        .defaults_to("false")
        .flag(),
    A::property("jvm_run_hprof", P::jvm("runHProf"), "Run HProf")
        .defaults_to("false")
        .flag(),
    A::property("jvm_hprof_arguments", P::jvm("hprofArguments"), "HProf arguments"),
    A::property("jvm_debug_mode", P::jvm("debugMode"), "JVM debug mode").flag(),
    A::property("jvm_debug_args", P::jvm("debugArgs"), "JVM debug arguments"),
    A::property(
        "jvm_executable_jar_filename",
        P::jvm("executableJarFileName"),
        "Executable JAR file name",
    ),
    A::property(
        "jvm_generic_jvm_arguments",
        P::jvm("genericJvmArguments"),
        "Generic JVM arguments",
    ),
    A::property("jvm_disable_jit", P::jvm("disableJIT"), "Disable the JIT").flag(),
    // thread pools
    A::property(
        "threadpool_webcontainer_min_size",
        P::named("ThreadPool", "WebContainer", "minimumSize"),
        "WebContainer thread pool minimum size",
    ),
    A::property(
        "threadpool_webcontainer_max_size",
        P::named("ThreadPool", "WebContainer", "maximumSize"),
        "WebContainer thread pool maximum size",
    ),
    // transactions
    A::property(
        "client_inactivity_timeout",
        P::child("TransactionService", "clientInactivityTimeout"),
        "TransactionService client inactivity timeout",
    ),
    A::property(
        "total_transaction_timeout",
        P::child("TransactionService", "totalTranLifetimeTimeout"),
        "TransactionService total transaction lifetime timeout",
    ),
    // process execution
    A::property("runas_user", P::child("ProcessExecution", "runAsUser"), "Run-as user"),
    A::property("runas_group", P::child("ProcessExecution", "runAsGroup"), "Run-as group"),
    A::property("umask", P::child("ProcessExecution", "umask"), "Process umask")
        .defaults_to("022"),
];

/// Look up a row by name
#[must_use]
pub fn find(table: &'static [A], name: &str) -> Option<&'static A> {
    table.iter().find(|d| d.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        for table in [CLUSTER_ATTRIBUTES, MEMBER_ATTRIBUTES] {
            let mut seen = HashSet::new();
            for d in table {
                assert!(seen.insert(d.name), "duplicate attribute {}", d.name);
            }
        }
    }

    #[test]
    fn defaults_pass_their_own_validation() {
        for table in [CLUSTER_ATTRIBUTES, MEMBER_ATTRIBUTES] {
            for d in table {
                if let Some(default) = d.default_value() {
                    assert!(d.validate(default).is_ok(), "default of {} is invalid", d.name);
                }
            }
        }
    }

    #[test]
    fn member_identity_keys() {
        let keys: Vec<_> = MEMBER_ATTRIBUTES
            .iter()
            .filter(|d| d.is_identity_key())
            .map(|d| d.name)
            .collect();
        assert_eq!(keys, ["server", "node_name", "cell", "cluster", "dmgr_profile"]);
    }

    #[test]
    fn gen_unique_ports_is_creation_only() {
        let d = find(MEMBER_ATTRIBUTES, "gen_unique_ports").unwrap();
        assert_eq!(d.create_option_name(), Some("genUniquePorts"));
        assert_eq!(d.remote_path(), None);
    }

    // create options land unquoted inside a bracketed option list
    #[test]
    fn create_options_accept_only_bare_tokens() {
        for d in MEMBER_ATTRIBUTES.iter().filter(|d| d.create_option_name().is_some()) {
            for bad in ["2 -x", "true]", "[true"] {
                assert!(d.validate(bad).is_err(), "{} accepted {bad:?}", d.name);
            }
        }
    }
}
