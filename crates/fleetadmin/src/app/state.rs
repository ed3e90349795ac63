#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Grid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreStatus {
    Idle,
    Loading,
    Error,
}

impl StoreStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StoreStatus::Idle => "READY",
            StoreStatus::Loading => "LOADING",
            StoreStatus::Error => "ERROR",
        }
    }
}
