//! Customers menu.

use std::io::Write;

use super::console::{Console, MenuResult};
use super::{render, App};
use crate::commands::customer::{self, CustomerDto, CustomerInput};

const LIST_LIMIT: u32 = 200;

pub async fn run<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    loop {
        console.say("")?;
        console.say("--- Customers ---")?;
        console.say("1) List")?;
        console.say("2) Add")?;
        console.say("3) Edit")?;
        console.say("4) Remove")?;
        console.say("0) Back")?;

        match console.ask_int("Select option: ").await? {
            1 => match customer::list_customers(&app.db, LIST_LIMIT).await {
                Ok(customers) => console.say(render::customers(&customers))?,
                Err(e) => console.say(e)?,
            },
            2 => add(app, console).await?,
            3 => edit(app, console).await?,
            4 => remove(app, console).await?,
            0 => return Ok(()),
            _ => console.say("Invalid option.")?,
        }
    }
}

async fn add<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let input = CustomerInput {
        name: console.ask_required("Name: ").await?,
        email: Some(console.ask("Email (optional): ").await?),
        phone: Some(console.ask("Phone (optional): ").await?),
    };
    match customer::create_customer(&app.db, input).await {
        Ok(c) => console.say(format!("Customer {} added.", c.name)),
        Err(e) => console.say(e),
    }
}

/// Blank answers keep the current value; `-` clears an optional field.
async fn edit<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let Some(current) = choose(app, console).await? else {
        return Ok(());
    };

    let name = console.ask(&format!("Name [{}]: ", current.name)).await?;
    let email = console
        .ask(&format!("Email [{}]: ", current.email.as_deref().unwrap_or("")))
        .await?;
    let phone = console
        .ask(&format!("Phone [{}]: ", current.phone.as_deref().unwrap_or("")))
        .await?;

    let keep = |answer: String, current: Option<String>| match answer.as_str() {
        "" => current,
        "-" => None,
        _ => Some(answer),
    };
    let input = CustomerInput {
        name: if name.is_empty() { current.name } else { name },
        email: keep(email, current.email),
        phone: keep(phone, current.phone),
    };
    match customer::update_customer(&app.db, &current.id, input).await {
        Ok(c) => console.say(format!("Customer {} updated.", c.name)),
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
    match customer::delete_customer(&app.db, &current.id).await {
        Ok(()) => console.say("Customer removed."),
        Err(e) => console.say(e),
    }
}

async fn choose<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult<Option<CustomerDto>> {
    let customers = match customer::list_customers(&app.db, LIST_LIMIT).await {
        Ok(customers) => customers,
        Err(e) => {
            console.say(e)?;
            return Ok(None);
        }
    };
    if customers.is_empty() {
        console.say("No customers found.")?;
        return Ok(None);
    }
    console.say(render::customers(&customers))?;

    let n = console.ask_int("Customer number (0 to cancel): ").await?;
    let chosen = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| customers.get(i).cloned());
    if chosen.is_none() && n != 0 {
        console.say("Invalid customer number.")?;
    }
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::super::console::testing::{output, scripted};
    use super::super::test_support::app;
    use super::*;

    #[tokio::test]
    async fn test_add_edit_remove() {
        let app = app().await;
        let mut console = scripted(&[
            "2", "Ana", "ana@example.com", "",
            "3", "1", "", "-", "555-0100",
            "4", "1", "y",
            "0",
        ]);

        run(&app, &mut console).await.unwrap();

        let out = output(console);
        assert!(out.contains("Customer Ana added."));
        assert!(out.contains("Customer Ana updated."));
        assert!(out.contains("Customer removed."));
        assert!(customer::list_customers(&app.db, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_is_reported() {
        let app = app().await;
        let mut console = scripted(&["2", "Ana", "nope", "", "0"]);

        run(&app, &mut console).await.unwrap();

        assert!(output(console).contains("[VALIDATION_ERROR]"));
    }
}
