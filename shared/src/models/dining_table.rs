use serde::{Deserialize, Serialize};

/// A physical table. Dine-in orders reference one; at most one active
/// order may occupy a table at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub capacity: i32,
    pub is_active: bool,
    pub created_at: i64,
}
