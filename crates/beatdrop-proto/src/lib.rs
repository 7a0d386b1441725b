//! Types shared between the song list controller and the front-ends that
//! host it: configuration, platform paths, and the command / notice protocol
//! the controller emits towards its collaborators.

pub mod config;
pub mod platform;
pub mod protocol;
