use alloy_primitives::Address;
use std::collections::HashSet;

/// Authorization check gating `register_root`.
pub trait AdminAuthority: Send + Sync {
    fn is_admin(&self, caller: Address) -> bool;
}

/// A single operator account.
impl AdminAuthority for Address {
    fn is_admin(&self, caller: Address) -> bool {
        *self == caller
    }
}

/// Any of several operator accounts.
#[derive(Clone, Debug, Default)]
pub struct AdminSet(pub HashSet<Address>);

impl AdminAuthority for AdminSet {
    fn is_admin(&self, caller: Address) -> bool {
        self.0.contains(&caller)
    }
}

impl FromIterator<Address> for AdminSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        AdminSet(iter.into_iter().collect())
    }
}
