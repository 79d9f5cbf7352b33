mod messenger;
pub mod twilio;

pub use self::messenger::Messenger;
