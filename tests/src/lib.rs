//! End-to-end checks of the engines over real loopback UDP sockets, with the
//! device side simulated by plain sockets on ephemeral ports.
#![cfg(test)]

mod console;
mod discovery;
mod net;
mod support;
