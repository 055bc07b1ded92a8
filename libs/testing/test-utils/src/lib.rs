//! Test helpers shared by the domain crates.
//!
//! `TestMongo` (feature "mongo") boots a throwaway MongoDB container;
//! `TestDataBuilder` derives stable email addresses from a test name so
//! repeated runs against a shared database never collide with each other.
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn stores_a_user() {
//!     let mongo = TestMongo::new().await;
//!     let data = TestDataBuilder::from_test_name("stores_a_user");
//!     let db = mongo.database();
//!     let email = data.email("owner");
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn from_test_name(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self {
            seed: hasher.finish(),
        }
    }

    /// Address on the reserved example.com domain, unique per test name.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::from_test_name("my_test");
    /// assert!(data.email("owner").ends_with("@example.com"));
    /// ```
    pub fn email(&self, local: &str) -> String {
        format!("{local}.{}@example.com", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_data() {
        let a = TestDataBuilder::from_test_name("join_flow");
        let b = TestDataBuilder::from_test_name("join_flow");
        assert_eq!(a.email("x"), b.email("x"));
    }

    #[test]
    fn different_names_do_not_collide() {
        let a = TestDataBuilder::from_test_name("one");
        let b = TestDataBuilder::from_test_name("two");
        assert_ne!(a.email("x"), b.email("x"));
    }
}
