// Application boundary: ports implemented by infra adapters

pub mod ports;
