pub mod console;
pub mod lifecycle;
pub mod schedule;
pub mod yahoo;

pub use console::ConsoleSink;
pub use lifecycle::Runner;
pub use schedule::DailySchedule;
pub use yahoo::YahooClient;
