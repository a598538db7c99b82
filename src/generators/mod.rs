//! Dynamic profile generators.
//!
//! A generator inspects the machine and produces profiles for what it finds.
//! Generated profiles join the builtin profiles, and the loader then gives
//! each of them a user profile that inherits from it. The set of generators
//! is fixed and they run in the order [`default_generators`] returns them.
//! Users turn a generator off by listing its namespace in
//! `disabledProfileSources`.

pub mod shells;
pub mod ssh;

pub use shells::{ShellInfo, ShellProfileGenerator};
pub use ssh::{SshHost, SshHostProfileGenerator};

use strata_config::Profile;

/// A producer of profiles.
pub trait ProfileGenerator: Send + Sync {
    /// Namespace written to the `source` of every generated profile.
    fn namespace(&self) -> &str;

    /// Append generated profiles to `profiles`.
    ///
    /// An error discards everything this generator produced during the call;
    /// the load continues without it.
    fn generate_profiles(&self, profiles: &mut Vec<Profile>) -> anyhow::Result<()>;

    /// Name of the generated profile a brand-new settings file should use as
    /// its default profile.
    fn preferred_default_profile_name(&self) -> Option<String> {
        None
    }
}

/// Every builtin generator, in execution order.
pub fn default_generators() -> Vec<Box<dyn ProfileGenerator>> {
    vec![
        Box::new(ShellProfileGenerator::detect()),
        Box::new(SshHostProfileGenerator::from_user_config()),
    ]
}
