use uuid::Uuid;

pub const UNKNOWN_VENDOR_NAME: &str = "Unknown";

string_enum! {
    /// The catalog collection that owns an order line.
    VendorKind {
        Store => "Store",
        VendingMachine => "VendingMachine",
    }
}

/// How an order line points at its vendor.
///
/// Lines carry the vendor as a free-form string: older stores use a short
/// numeric code (e.g. `"69"`), newer ones the database id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorKey {
    Id(Uuid),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRef {
    pub kind: VendorKind,
    pub key: VendorKey,
}

impl VendorRef {
    pub fn parse(kind: VendorKind, raw: &str) -> Self {
        let key = match Uuid::parse_str(raw) {
            Ok(id) => VendorKey::Id(id),
            Err(_) => VendorKey::Code(raw.to_string()),
        };
        Self { kind, key }
    }

    /// The string form as stored on order lines.
    pub fn raw(&self) -> String {
        match &self.key {
            VendorKey::Id(id) => id.to_string(),
            VendorKey::Code(code) => code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub kind: VendorKind,
    pub id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub email: Option<String>,
}
