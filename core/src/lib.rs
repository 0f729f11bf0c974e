//! Protocol engines that drive a bootloader netconsole.
//!
//! A run goes through the engines in order: [`prober`] finds a free address,
//! [`bringup`] wakes the console, [`session`] exchanges commands (sequenced by
//! [`script`] when a script is given), and [`discovery`] relocates the device
//! after a reboot. The engines only talk to each other through the immutable
//! [`plum_common::Context`].

pub mod bringup;
pub mod discovery;
pub mod network;
pub mod prober;
pub mod script;
pub mod session;
