//! Sales menu: history, receipts and deletion.
//!
//! New sales are only made on the checkout screen.

use std::io::Write;

use super::console::{Console, MenuResult};
use super::{render, App};
use crate::commands::sale::{self, SaleSummaryDto};

const HISTORY_LIMIT: u32 = 50;

pub async fn run<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    loop {
        console.say("")?;
        console.say("--- Sales ---")?;
        console.say("1) List")?;
        console.say("2) Show receipt")?;
        console.say("3) Remove")?;
        console.say("0) Back")?;

        match console.ask_int("Select option: ").await? {
            1 => match sale::list_sales(&app.db, HISTORY_LIMIT).await {
                Ok(sales) => console.say(render::sales(app, &sales))?,
                Err(e) => console.say(e)?,
            },
            2 => {
                if let Some(chosen) = choose(app, console).await? {
                    match sale::get_receipt(&app.db, &app.config, &chosen.id).await {
                        Ok(receipt) => console.say(render::receipt(app, &receipt))?,
                        Err(e) => console.say(e)?,
                    }
                }
            }
            3 => remove(app, console).await?,
            0 => return Ok(()),
            _ => console.say("Invalid option.")?,
        }
    }
}

/// Deleting a sale puts its quantities back into stock.
async fn remove<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let Some(chosen) = choose(app, console).await? else {
        return Ok(());
    };
    let label = format!(
        "Remove sale of {} for {}? Stock will be restored (y/n): ",
        app.money(chosen.total_cents),
        chosen.customer_name
    );
    if !console.confirm(&label).await? {
        return Ok(());
    }

    match sale::delete_sale(&app.db, &chosen.id).await {
        Ok(restored) => {
            let units: i64 = restored.iter().map(|r| r.quantity).sum();
            console.say(format!(
                "Sale removed. {} unit(s) back in stock across {} product(s).",
                units,
                restored.len()
            ))
        }
        Err(e) => console.say(e),
    }
}

async fn choose<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult<Option<SaleSummaryDto>> {
    let sales = match sale::list_sales(&app.db, HISTORY_LIMIT).await {
        Ok(sales) => sales,
        Err(e) => {
            console.say(e)?;
            return Ok(None);
        }
    };
    if sales.is_empty() {
        console.say("No sales found.")?;
        return Ok(None);
    }
    console.say(render::sales(app, &sales))?;

    let n = console.ask_int("Sale number (0 to cancel): ").await?;
    let chosen = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| sales.get(i).cloned());
    if chosen.is_none() && n != 0 {
        console.say("Invalid sale number.")?;
    }
    Ok(chosen)
}
