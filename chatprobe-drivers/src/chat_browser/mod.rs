pub mod driver;
pub mod page;
pub mod stealth;
mod webdriver_page;

pub use webdriver_page::WebDriverPage;
