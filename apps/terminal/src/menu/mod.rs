//! # Text Menu
//!
//! Numbered menus on stdin/stdout.
//!
//! ```text
//! === Tally POS ===
//! 1) Checkout      ──► checkout::run   (scan loop, cart, finalize)
//! 2) Products      ──► products::run   (list/search/add/edit/stock/remove)
//! 3) Customers     ──► customers::run  (list/add/edit/remove)
//! 4) Sales         ──► sales::run      (history/receipt/delete)
//! 5) Backup        ──► commands::backup
//! 0) Exit
//! ```
//!
//! Command failures are printed as `[CODE] message` and the operator stays
//! on the same screen. Only console failures or end of input leave a menu.

mod checkout;
mod console;
mod customers;
mod products;
mod render;
mod sales;

pub use console::{spawn_stdin_reader, Console, MenuError, MenuResult};

use std::io::Write;

use tracing::info;

use crate::commands;
use crate::state::{ConfigState, DbState};

/// Everything the menus need, owned by the foreground task.
#[derive(Debug, Clone)]
pub struct App {
    pub db: DbState,
    pub config: ConfigState,
}

impl App {
    pub fn new(db: DbState, config: ConfigState) -> Self {
        App { db, config }
    }

    /// Formats cents with the configured currency.
    pub(crate) fn money(&self, cents: i64) -> String {
        self.config.format_currency(cents)
    }
}

/// Runs the main menu until Exit or end of input.
pub async fn run<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    match main_menu(app, console).await {
        Err(MenuError::InputClosed) => {
            info!("Input closed, leaving");
            Ok(())
        }
        other => other,
    }
}

async fn main_menu<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    loop {
        console.say("")?;
        console.say(format!("=== {} ===", app.config.store_name))?;
        console.say("1) Checkout")?;
        console.say("2) Products")?;
        console.say("3) Customers")?;
        console.say("4) Sales")?;
        console.say("5) Backup")?;
        console.say("0) Exit")?;

        match console.ask_int("Select option: ").await? {
            1 => checkout::run(app, console).await?,
            2 => products::run(app, console).await?,
            3 => customers::run(app, console).await?,
            4 => sales::run(app, console).await?,
            5 => match commands::backup::backup_database(&app.db, &app.config).await {
                Ok(backup) => console.say(format!("Backup written to {}", backup.path))?,
                Err(e) => console.say(e)?,
            },
            0 => {
                console.say("Bye.")?;
                return Ok(());
            }
            _ => console.say("Invalid option.")?,
        }
    }
}
