/*
[INPUT]:  Subcommands parsed by the binary
[OUTPUT]: Interactive CLI flows
[POS]:    CLI layer
[UPDATE]: When adding new subcommands
*/

pub mod init;

pub use init::run_init;
