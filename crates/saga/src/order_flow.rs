//! Order placement saga constants.

/// The saga type identifier for order placement.
pub const SAGA_TYPE: &str = "OrderPlacement";

/// Step name: Validate the customer and business references.
pub const STEP_VALIDATE_PARTIES: &str = "validate_parties";

/// Step name: Reserve inventory for each order line.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Step name: Create the order record.
pub const STEP_CREATE_ORDER: &str = "create_order";

/// Step name: Initiate payment with the gateway.
pub const STEP_INITIATE_PAYMENT: &str = "initiate_payment";

/// Step name: Settle the order after the gateway callback.
pub const STEP_SETTLE: &str = "settle";
