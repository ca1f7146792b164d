use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .unwrap_or("BiteWise");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes every hot query path relies on.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        for (name, keys, unique) in Self::index_specs() {
            let collection = self.db.collection::<mongodb::bson::Document>(name);
            let options = IndexOptions::builder().unique(unique).build();
            let index = IndexModel::builder().keys(keys.clone()).options(options).build();
            match collection.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}{}", name, keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    /// (collection, keys, unique). The one-doc-per-key collections get unique
    /// indexes so a concurrent double-insert loses at the storage layer, not
    /// just at the application-level compare-and-set.
    fn index_specs() -> Vec<(&'static str, mongodb::bson::Document, bool)> {
        use mongodb::bson::doc;

        vec![
            // Login and profile lookups; one account per id and per email
            ("users", doc! { "user_id": 1 }, true),
            ("users", doc! { "email": 1 }, true),
            ("nutritionists", doc! { "nutritionist_id": 1 }, true),
            ("nutritionists", doc! { "email": 1 }, true),
            ("nutritionists", doc! { "verification_status": 1 }, false),
            // Coaching state machine: per-pair status checks
            ("coach_requests", doc! { "user_id": 1, "nutritionist_id": 1, "status": 1 }, false),
            ("coach_requests", doc! { "nutritionist_id": 1, "status": 1 }, false),
            ("coach_requests", doc! { "request_id": 1 }, true),
            // Meal logging: one doc per user per day
            ("daily_consumption", doc! { "user_id": 1, "date": 1 }, true),
            // Messaging: one chat doc per user-coach pair
            ("chats", doc! { "chat_id": 1 }, true),
            ("chats", doc! { "user_id": 1 }, false),
            ("chats", doc! { "nutritionist_id": 1 }, false),
            ("chat_messages", doc! { "chat_id": 1, "created_at": 1 }, false),
            // Ratings and blocks: one doc per (coach, user) pair
            ("coach_ratings", doc! { "nutritionist_id": 1, "user_id": 1 }, true),
            ("blocked_coaches", doc! { "user_id": 1, "nutritionist_id": 1 }, true),
            // Notification history per recipient
            ("notifications", doc! { "recipient_id": 1, "created_at": -1 }, false),
            ("feedback", doc! { "status": 1 }, false),
            ("barcode_cache", doc! { "barcode": 1 }, true),
        ]
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unique(collection: &str, first_key: &str) -> bool {
        MongoDB::index_specs()
            .iter()
            .find(|(name, keys, _)| {
                *name == collection
                    && keys.iter().next().map(|(key, _)| key.as_str()) == Some(first_key)
            })
            .map(|(_, _, unique)| *unique)
            .unwrap_or(false)
    }

    #[test]
    fn test_one_doc_per_key_collections_have_unique_indexes() {
        assert!(is_unique("users", "email"));
        assert!(is_unique("users", "user_id"));
        assert!(is_unique("nutritionists", "email"));
        assert!(is_unique("chats", "chat_id"));
        assert!(is_unique("daily_consumption", "user_id"));
        assert!(is_unique("coach_ratings", "nutritionist_id"));
        assert!(is_unique("blocked_coaches", "user_id"));
        assert!(is_unique("coach_requests", "request_id"));
    }

    #[test]
    fn test_status_lookup_indexes_stay_non_unique() {
        // Many requests share a (nutritionist_id, status) pair
        assert!(!is_unique("coach_requests", "nutritionist_id"));
        assert!(!is_unique("notifications", "recipient_id"));
    }
}
