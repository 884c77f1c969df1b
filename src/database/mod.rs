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

        // Connection pool otimizado
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
            .unwrap_or("MediFind");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates necessary indexes for optimal query performance
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;

        log::info!("🔧 Creating database indexes...");

        // users: lookup por user_id e por email (login)
        self.create_index("users", doc! { "user_id": 1 }).await;
        self.create_index("users", doc! { "email": 1 }).await;

        // facilities: listagem filtra por categoria e busca por título
        self.create_index("facilities", doc! { "category": 1 }).await;
        self.create_index("facilities", doc! { "title": 1 }).await;
        self.create_index("facilities", doc! { "facility_id": 1 }).await;

        self.create_index("pharmacies", doc! { "title": 1 }).await;
        self.create_index("pharmacies", doc! { "pharmacy_id": 1 }).await;

        // assignment collections: todas as queries são por user_id
        self.create_index("hospital_managers", doc! { "user_id": 1 }).await;
        self.create_index("clinic_managers", doc! { "user_id": 1 }).await;
        self.create_index("pharmacy_managers", doc! { "user_id": 1 }).await;

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    async fn create_index(&self, collection: &str, keys: mongodb::bson::Document) {
        use mongodb::IndexModel;

        let coll = self
            .db
            .collection::<mongodb::bson::Document>(collection);

        let index = IndexModel::builder().keys(keys.clone()).build();

        match coll.create_index(index).await {
            Ok(_) => log::info!("   ✅ Index created: {}{}", collection, keys),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }
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
