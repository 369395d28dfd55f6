//! Products menu: catalog listing, edits and stock movements.

use std::io::Write;

use tally_core::Money;

use super::console::{Console, MenuResult};
use super::{render, App};
use crate::commands::product::{self, ProductDto, ProductInput};

/// Rows shown by List.
const LIST_LIMIT: u32 = 200;

pub async fn run<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    loop {
        console.say("")?;
        console.say("--- Products ---")?;
        console.say("1) List")?;
        console.say("2) Search")?;
        console.say("3) Add")?;
        console.say("4) Edit")?;
        console.say("5) Restock")?;
        console.say("6) Write off")?;
        console.say("7) Remove")?;
        console.say("0) Back")?;

        match console.ask_int("Select option: ").await? {
            1 => match product::list_products(&app.db, LIST_LIMIT).await {
                Ok(products) => console.say(render::products(app, &products))?,
                Err(e) => console.say(e)?,
            },
            2 => {
                let query = console.ask("Search: ").await?;
                match product::search_products(&app.db, &query, app.config.search_limit).await {
                    Ok(products) => console.say(render::products(app, &products))?,
                    Err(e) => console.say(e)?,
                }
            }
            3 => add(app, console).await?,
            4 => edit(app, console).await?,
            5 => move_stock(app, console, StockMove::Restock).await?,
            6 => move_stock(app, console, StockMove::WriteOff).await?,
            7 => remove(app, console).await?,
            0 => return Ok(()),
            _ => console.say("Invalid option.")?,
        }
    }
}

async fn add<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let name = console.ask_required("Name: ").await?;
    let barcode = console.ask("Barcode (optional): ").await?;
    let price_cents = ask_money(console, "Price: ", None).await?;
    let cost_cents = ask_optional_money(console, "Cost (optional): ", None).await?;
    let stock = console.ask_int("Initial stock: ").await?;

    let input = ProductInput {
        name,
        barcode: Some(barcode),
        price_cents,
        cost_cents,
    };
    match product::create_product(&app.db, input, stock).await {
        Ok(p) => console.say(format!("Product {} added.", p.name)),
        Err(e) => console.say(e),
    }
}

/// Blank answers keep the current value.
async fn edit<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let Some(current) = choose(app, console).await? else {
        return Ok(());
    };

    let name = console.ask(&format!("Name [{}]: ", current.name)).await?;
    let barcode = console
        .ask(&format!(
            "Barcode [{}] (- to clear): ",
            current.barcode.as_deref().unwrap_or("")
        ))
        .await?;
    let price_cents = ask_money(
        console,
        &format!("Price [{}]: ", app.money(current.price_cents)),
        Some(current.price_cents),
    )
    .await?;
    let cost_cents = ask_optional_money(
        console,
        &format!(
            "Cost [{}]: ",
            current.cost_cents.map(|c| app.money(c)).unwrap_or_default()
        ),
        current.cost_cents,
    )
    .await?;

    let input = ProductInput {
        name: if name.is_empty() { current.name } else { name },
        barcode: match barcode.as_str() {
            "" => current.barcode,
            "-" => None,
            _ => Some(barcode),
        },
        price_cents,
        cost_cents,
    };
    match product::update_product(&app.db, &current.id, input).await {
        Ok(p) => console.say(format!("Product {} updated.", p.name)),
        Err(e) => console.say(e),
    }
}

enum StockMove {
    Restock,
    WriteOff,
}

async fn move_stock<W: Write>(app: &App, console: &mut Console<W>, kind: StockMove) -> MenuResult {
    let Some(current) = choose(app, console).await? else {
        return Ok(());
    };
    let quantity = console.ask_int("Quantity: ").await?;

    let result = match kind {
        StockMove::Restock => product::restock_product(&app.db, &current.id, quantity).await,
        StockMove::WriteOff => product::write_off_product(&app.db, &current.id, quantity).await,
    };
    match result {
        Ok(change) => console.say(format!("{} stock is now {}.", current.name, change.stock)),
        Err(e) => console.say(e),
    }
}

async fn remove<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let Some(current) = choose(app, console).await? else {
        return Ok(());
    };
    if !console.confirm(&format!("Remove {}? (y/n): ", current.name)).await? {
        return Ok(());
    }
    match product::deactivate_product(&app.db, &current.id).await {
        Ok(()) => console.say("Product removed."),
        Err(e) => console.say(e),
    }
}

/// Searches, lists matches and lets the operator pick one by number.
async fn choose<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult<Option<ProductDto>> {
    let query = console.ask("Find product (blank lists all): ").await?;
    let products = match product::search_products(&app.db, &query, LIST_LIMIT).await {
        Ok(products) => products,
        Err(e) => {
            console.say(e)?;
            return Ok(None);
        }
    };
    if products.is_empty() {
        console.say("No products found.")?;
        return Ok(None);
    }
    console.say(render::products(app, &products))?;

    let n = console.ask_int("Product number (0 to cancel): ").await?;
    let chosen = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| products.get(i).cloned());
    if chosen.is_none() && n != 0 {
        console.say("Invalid product number.")?;
    }
    Ok(chosen)
}

/// Prompts for an amount like `9.99`. Blank keeps `current` when given.
async fn ask_money<W: Write>(
    console: &mut Console<W>,
    label: &str,
    current: Option<i64>,
) -> MenuResult<i64> {
    loop {
        let input = console.ask(label).await?;
        if input.is_empty() {
            if let Some(cents) = current {
                return Ok(cents);
            }
            console.say("Value cannot be empty.")?;
            continue;
        }
        match Money::parse(&input) {
            Some(money) => return Ok(money.cents()),
            None => console.say("Invalid amount. Use a number like 9.99.")?,
        }
    }
}

/// Like [`ask_money`], but blank with no current value means "none".
async fn ask_optional_money<W: Write>(
    console: &mut Console<W>,
    label: &str,
    current: Option<i64>,
) -> MenuResult<Option<i64>> {
    loop {
        let input = console.ask(label).await?;
        if input.is_empty() {
            return Ok(current);
        }
        match Money::parse(&input) {
            Some(money) => return Ok(Some(money.cents())),
            None => console.say("Invalid amount. Use a number like 9.99.")?,
        }
    }
}
