//! Macros for printing styled messages to the console. Callers need `Colorize` in scope.
#[macro_export]
macro_rules! success_message {
    ($($arg:tt)*) => {
        println!("{} {}", "[SUCCESS]".green().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "  [ERROR]".red().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "[WARNING]".yellow().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_message {
    ($($arg:tt)*) => {
        println!("{} {}", "   [INFO]".cyan().bold(), format!($($arg)*));
    };
}
