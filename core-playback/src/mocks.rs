//! Shared mockall doubles for host storage and the media index.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{JsonStore, MediaIndexProvider, SettingsStore, Track};
use mockall::mock;

mock! {
    pub Settings {}

    #[async_trait]
    impl SettingsStore for Settings {
        async fn set_string(&self, key: &str, value: &str) -> Result<()>;
        async fn get_string(&self, key: &str) -> Result<Option<String>>;
        async fn set_bool(&self, key: &str, value: bool) -> Result<()>;
        async fn get_bool(&self, key: &str) -> Result<Option<bool>>;
        async fn set_i64(&self, key: &str, value: i64) -> Result<()>;
        async fn get_i64(&self, key: &str) -> Result<Option<i64>>;
        async fn delete(&self, key: &str) -> Result<()>;
        async fn has_key(&self, key: &str) -> Result<bool>;
    }
}

mock! {
    pub Documents {}

    #[async_trait]
    impl JsonStore for Documents {
        async fn save_json(&self, name: &str, text: &str) -> Result<()>;
        async fn load_json(&self, name: &str) -> Result<Option<String>>;
    }
}

mock! {
    pub Index {}

    #[async_trait]
    impl MediaIndexProvider for Index {
        async fn retrieve_songs(&self) -> Result<Vec<Track>>;
    }
}
