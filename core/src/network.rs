pub mod channel;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;
