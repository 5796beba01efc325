/// Workload label holding the port to expose.
pub const PORT_LABEL: &str = "port";
/// Workload label requesting an ingress when set to [`INGRESS_REQUESTED_VALUE`].
pub const INGRESS_REQUEST_LABEL: &str = "ingReq";
pub const INGRESS_REQUESTED_VALUE: &str = "needed";
