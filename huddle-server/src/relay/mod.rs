mod relay;
mod relay_command;

pub use relay::Relay;
pub use relay_command::RelayCommand;
