// ============================================================================
// Schema - applied on Store startup (idempotent)
// ============================================================================

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS members (
    member_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    city           TEXT NOT NULL,
    street         TEXT NOT NULL,
    zipcode        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    kind           TEXT NOT NULL,
    name           TEXT NOT NULL,
    price          INTEGER NOT NULL,
    stock_quantity INTEGER NOT NULL CHECK (stock_quantity >= 0),
    author         TEXT,
    isbn           TEXT
);

CREATE TABLE IF NOT EXISTS orders (
    order_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id      INTEGER NOT NULL REFERENCES members (member_id),
    order_date     TEXT NOT NULL,
    status         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS deliveries (
    delivery_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id       INTEGER NOT NULL UNIQUE REFERENCES orders (order_id),
    city           TEXT NOT NULL,
    street         TEXT NOT NULL,
    zipcode        TEXT NOT NULL,
    status         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS order_items (
    order_item_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id       INTEGER NOT NULL REFERENCES orders (order_id),
    item_id        INTEGER NOT NULL REFERENCES items (item_id),
    order_price    INTEGER NOT NULL,
    count          INTEGER NOT NULL CHECK (count > 0)
);

CREATE INDEX IF NOT EXISTS idx_orders_member ON orders (member_id);
CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items (order_id);
"#;
