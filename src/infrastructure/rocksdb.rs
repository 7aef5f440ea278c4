use crate::domain::order::{Order, OrderDraft, OrderId, UserId};
use crate::domain::ports::OrderRepository;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for order documents, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family mapping idempotency keys to order ids.
pub const CF_IDEMPOTENCY: &str = "idempotency";

/// A persistent order store backed by RocksDB.
///
/// Orders are stored as JSON documents. An order and its idempotency key are
/// written in one batch so neither exists without the other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBOrderStore {
    db: Arc<DB>,
    // Serializes read-modify-write sequences (key uniqueness, updates).
    writes: Arc<Mutex<()>>,
}

impl RocksDBOrderStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("orders" and "idempotency") exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_idempotency = ColumnFamilyDescriptor::new(CF_IDEMPOTENCY, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_idempotency])?;

        Ok(Self {
            db: Arc::new(db),
            writes: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            CheckoutError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read_order(&self, id: OrderId) -> Result<Option<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(cf, id.0.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode(order: &Order) -> Result<Vec<u8>> {
    serde_json::to_vec(order).map_err(|e| {
        CheckoutError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {e}"),
        )))
    })
}

fn decode(bytes: &[u8]) -> Result<Order> {
    serde_json::from_slice(bytes).map_err(|e| {
        CheckoutError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {e}"),
        )))
    })
}

#[async_trait]
impl OrderRepository for RocksDBOrderStore {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        let _guard = self.writes.lock().await;
        let orders = self.cf(CF_ORDERS)?;
        let idempotency = self.cf(CF_IDEMPOTENCY)?;

        if let Some(key) = draft.idempotency_key()
            && self.db.get_pinned_cf(idempotency, key.as_bytes())?.is_some()
        {
            return Err(CheckoutError::DuplicateCheckout(key.to_string()));
        }

        let order = draft.into_order(Utc::now());
        let mut batch = WriteBatch::default();
        batch.put_cf(orders, order.id.0.as_bytes(), encode(&order)?);
        if let Some(key) = &order.idempotency_key {
            batch.put_cf(idempotency, key.as_bytes(), order.id.0.as_bytes());
        }
        self.db.write(batch)?;

        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<()> {
        let _guard = self.writes.lock().await;
        if self.read_order(order.id)?.is_none() {
            return Err(CheckoutError::OrderNotFound(order.id));
        }
        let cf = self.cf(CF_ORDERS)?;
        self.db.put_cf(cf, order.id.0.as_bytes(), encode(&order)?)?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.read_order(id)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        let cf = self.cf(CF_IDEMPOTENCY)?;
        let Some(bytes) = self.db.get_cf(cf, key.as_bytes())? else {
            return Ok(None);
        };
        let id = uuid::Uuid::from_slice(&bytes).map_err(|e| {
            CheckoutError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Corrupt idempotency entry for {key}: {e}"),
            )))
        })?;
        self.read_order(OrderId(id))
    }

    async fn list(&self, buyer: Option<&UserId>) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;

        let mut orders = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let order = decode(&value)?;
            if buyer.is_none_or(|buyer| &order.buyer == buyer) {
                orders.push(order);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
