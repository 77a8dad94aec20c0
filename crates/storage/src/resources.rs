//! Well-known storage resource names and the provisioning manifest.

/// Table holding [`Customer`](abc_retail_core::Customer) rows.
pub const CUSTOMERS_TABLE: &str = "Customers";
/// Table holding [`Product`](abc_retail_core::Product) rows.
pub const PRODUCTS_TABLE: &str = "Products";
/// Table holding [`Order`](abc_retail_core::Order) rows.
pub const ORDERS_TABLE: &str = "Orders";

/// Container for product images.
pub const PRODUCT_IMAGES_CONTAINER: &str = "productimages";
/// Container for uploaded proofs of payment.
pub const PAYMENT_PROOFS_CONTAINER: &str = "paymentproofs";

/// Queue receiving order lifecycle notifications.
pub const ORDERS_QUEUE: &str = "orders";
/// Queue for general notifications.
pub const NOTIFICATIONS_QUEUE: &str = "notifications";

/// File share holding contract documents.
pub const CONTRACTS_SHARE: &str = "contracts";
/// Directory in [`CONTRACTS_SHARE`] holding proofs of payment.
pub const PAYMENT_PROOFS_DIRECTORY: &str = "payment-proofs";

/// A file share and the directories that must exist inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareManifest {
    pub name: String,
    pub directories: Vec<String>,
}

/// Every named resource that must exist before first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceManifest {
    pub tables: Vec<String>,
    pub containers: Vec<String>,
    pub queues: Vec<String>,
    pub shares: Vec<ShareManifest>,
}

impl Default for ResourceManifest {
    fn default() -> Self {
        let owned =
            |names: &[&str]| -> Vec<String> { names.iter().map(|&n| n.to_owned()).collect() };
        Self {
            tables: owned(&[CUSTOMERS_TABLE, PRODUCTS_TABLE, ORDERS_TABLE]),
            containers: owned(&[PRODUCT_IMAGES_CONTAINER, PAYMENT_PROOFS_CONTAINER]),
            queues: owned(&[ORDERS_QUEUE, NOTIFICATIONS_QUEUE]),
            shares: vec![ShareManifest {
                name: CONTRACTS_SHARE.to_owned(),
                directories: vec![PAYMENT_PROOFS_DIRECTORY.to_owned()],
            }],
        }
    }
}

/// Outcome of a provisioning run.
///
/// Resources are labelled `kind:name` (e.g. `table:Orders`,
/// `directory:contracts/payment-proofs`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

impl ProvisionReport {
    pub(crate) fn record(&mut self, label: String, created: bool) {
        if created {
            self.created.push(label);
        } else {
            self.existing.push(label);
        }
    }
}
