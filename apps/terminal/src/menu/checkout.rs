//! # Checkout Screen
//!
//! The scan loop. One task owns the [`CheckoutSession`]; lookups run on
//! dispatcher workers and come back as events.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  loop {                                                                 │
//! │    select! {                                                            │
//! │      operator line ──► ":cmd ..."  ──► cart / sale commands            │
//! │                    └─► anything else ──► dispatcher.submit(Scan)       │
//! │      dispatch event ──► Resolved    ──► cart::add_scanned              │
//! │                     ├─► Candidates  ──► numbered list for :pick        │
//! │                     ├─► NotFound / LookupFailed ──► message            │
//! │                     └─► ReassertFocus ──► re-print the scan prompt     │
//! │    }                                                                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Write;

use tally_core::{CheckoutPhase, CheckoutSession, Product};
use tokio::sync::mpsc;
use tracing::debug;

use super::console::{Console, MenuError, MenuResult};
use super::{render, App};
use crate::commands::customer::CustomerDto;
use crate::commands::product::ProductDto;
use crate::commands::{cart, customer, sale};
use crate::scan::{DispatchConfig, DispatchEvent, FocusKeeper, ScanDispatcher, ScanInput};

const HELP: &str = "\
Scan a barcode or type a name. Commands:
  :cart              show the cart
  :qty <line> <n>    set quantity of a line
  :rm <line>         remove a line
  :pick <n>          add the n-th search match
  :customer [n]      list customers / choose the n-th
  :search on|off     typing mode (stops prompt re-arming)
  :done              finalize the sale
  :clear             abandon the cart
  :quit              back to the main menu";

/// Customers shown by `:customer`.
const CUSTOMER_LIST_LIMIT: u32 = 50;

enum Step {
    Input(Option<String>),
    Event(DispatchEvent),
}

enum Flow {
    Stay,
    Leave,
}

pub async fn run<W: Write>(app: &App, console: &mut Console<W>) -> MenuResult {
    let (mut screen, mut events) = Screen::new(app);

    console.say("")?;
    console.say("--- Checkout ---")?;
    console.say(HELP)?;

    let result = screen.run(console, &mut events).await;
    screen.keeper.stop();
    result
}

struct Screen<'a> {
    app: &'a App,
    session: CheckoutSession,
    dispatcher: ScanDispatcher,
    keeper: FocusKeeper,
    /// Matches from the last text search, for `:pick`.
    candidates: Vec<Product>,
    /// Customers from the last `:customer` listing.
    customers: Vec<CustomerDto>,
}

impl<'a> Screen<'a> {
    fn new(app: &'a App) -> (Self, mpsc::Receiver<DispatchEvent>) {
        let (dispatcher, events) = ScanDispatcher::new(
            app.db.inner().clone(),
            DispatchConfig {
                lookup_timeout: app.config.lookup_timeout(),
                search_limit: app.config.search_limit,
            },
        );
        let keeper = FocusKeeper::start(app.config.focus_interval(), dispatcher.events());

        let screen = Screen {
            app,
            session: CheckoutSession::new(),
            dispatcher,
            keeper,
            candidates: Vec::new(),
            customers: Vec::new(),
        };
        (screen, events)
    }

    async fn run<W: Write>(
        &mut self,
        console: &mut Console<W>,
        events: &mut mpsc::Receiver<DispatchEvent>,
    ) -> MenuResult {
        self.prompt(console)?;

        loop {
            let step = tokio::select! {
                line = console.next_line() => Step::Input(line),
                Some(event) = events.recv() => Step::Event(event),
            };

            match step {
                Step::Input(None) => return Err(MenuError::InputClosed),
                Step::Input(Some(line)) => {
                    if let Flow::Leave = self.handle_line(console, line.trim()).await? {
                        return Ok(());
                    }
                    self.prompt(console)?;
                }
                Step::Event(DispatchEvent::ReassertFocus) => {
                    if console.is_dirty() {
                        self.prompt(console)?;
                    }
                }
                Step::Event(event) => {
                    self.apply_event(console, event)?;
                    // With the lock off nothing re-arms the prompt later.
                    if !self.keeper.focus_lock() {
                        self.prompt(console)?;
                    }
                }
            }
        }
    }

    fn prompt<W: Write>(&self, console: &mut Console<W>) -> MenuResult {
        if self.keeper.focus_lock() {
            console.prompt("scan> ")
        } else {
            console.prompt("search> ")
        }
    }

    // =========================================================================
    // Operator input
    // =========================================================================

    async fn handle_line<W: Write>(&mut self, console: &mut Console<W>, line: &str) -> MenuResult<Flow> {
        if line.is_empty() {
            return Ok(Flow::Stay);
        }

        let Some(command) = line.strip_prefix(':') else {
            self.dispatcher.submit(ScanInput::Scan(line.to_string()));
            return Ok(Flow::Stay);
        };

        let mut args = command.split_whitespace();
        let name = args.next().unwrap_or_default();
        let args: Vec<&str> = args.collect();
        debug!(command = %name, ?args, "Checkout command");

        match (name, args.as_slice()) {
            ("help", _) => console.say(HELP)?,
            ("cart", _) => self.show_cart(console)?,
            ("qty", [line, quantity]) => match (line.parse::<usize>(), quantity.parse::<i64>()) {
                (Ok(position), Ok(quantity)) => {
                    match cart::set_line_quantity(&self.app.db, &mut self.session, position, quantity)
                        .await
                    {
                        Ok(update) => {
                            console.say(format!("{}: {}", update.name, update.notice))?;
                            console.say(render::cart(self.app, &update.cart))?;
                        }
                        Err(e) => console.say(e)?,
                    }
                }
                _ => console.say("Usage: :qty <line> <quantity>")?,
            },
            ("rm", [line]) => match line.parse::<usize>() {
                Ok(position) => match cart::remove_line(&mut self.session, position) {
                    Ok(response) => console.say(render::cart(self.app, &response))?,
                    Err(e) => console.say(e)?,
                },
                Err(_) => console.say("Usage: :rm <line>")?,
            },
            ("pick", [n]) => {
                let picked = n
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.candidates.get(i));
                match picked {
                    Some(product) => {
                        self.dispatcher.submit(ScanInput::Pick(product.id.clone()));
                    }
                    None => console.say(format!("No match {n}; search first"))?,
                }
            }
            ("customer", []) => self.list_customers(console).await?,
            ("customer", [n]) => self.choose_customer(console, n).await?,
            ("search", ["on"]) => {
                self.keeper.set_focus_lock(false);
                console.say("Search mode: type a name, :pick to add.")?;
            }
            ("search", ["off"]) => {
                self.keeper.set_focus_lock(true);
                console.say("Scan mode.")?;
            }
            ("done", _) => self.finalize(console).await?,
            ("clear", _) => {
                cart::clear_cart(&mut self.session);
                self.candidates.clear();
                console.say("Cart cleared.")?;
            }
            ("quit", _) => {
                if !self.session.cart().is_empty() {
                    cart::clear_cart(&mut self.session);
                    console.say("Cart abandoned.")?;
                }
                return Ok(Flow::Leave);
            }
            ("qty", _) => console.say("Usage: :qty <line> <quantity>")?,
            ("rm", _) => console.say("Usage: :rm <line>")?,
            ("pick", _) => console.say("Usage: :pick <n>")?,
            ("search", _) => console.say("Usage: :search on|off")?,
            _ => console.say("Unknown command. :help lists commands.")?,
        }

        Ok(Flow::Stay)
    }

    fn show_cart<W: Write>(&self, console: &mut Console<W>) -> MenuResult {
        let response = cart::get_cart(&self.session);
        console.say(render::cart(self.app, &response))?;
        if let Some(id) = &response.customer_id {
            let name = self
                .customers
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.as_str())
                .unwrap_or(id.as_str());
            console.say(format!("     Customer: {name}"))?;
        }
        Ok(())
    }

    async fn list_customers<W: Write>(&mut self, console: &mut Console<W>) -> MenuResult {
        match customer::list_customers(&self.app.db, CUSTOMER_LIST_LIMIT).await {
            Ok(customers) => {
                console.say(render::customers(&customers))?;
                self.customers = customers;
            }
            Err(e) => console.say(e)?,
        }
        Ok(())
    }

    async fn choose_customer<W: Write>(&mut self, console: &mut Console<W>, n: &str) -> MenuResult {
        if self.customers.is_empty() {
            self.list_customers(console).await?;
        }
        let chosen = n
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.customers.get(i));

        match chosen {
            Some(c) => {
                self.session.set_customer(Some(c.id.clone()));
                console.say(format!("Customer: {}", c.name))?;
            }
            None => console.say(format!("No customer {n}; :customer lists them"))?,
        }
        Ok(())
    }

    async fn finalize<W: Write>(&mut self, console: &mut Console<W>) -> MenuResult {
        match sale::finalize_sale(&self.app.db, &self.app.config, &mut self.session).await {
            Ok(receipt) => {
                console.say(render::receipt(self.app, &receipt))?;
                self.candidates.clear();
            }
            Err(e) => {
                console.say(e)?;
                if let CheckoutPhase::Aborted { .. } = self.session.phase() {
                    console.say("Sale not saved. Fix the cart and :done again.")?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Dispatch results
    // =========================================================================

    fn apply_event<W: Write>(&mut self, console: &mut Console<W>, event: DispatchEvent) -> MenuResult {
        match event {
            DispatchEvent::Resolved { line, .. } => match cart::add_scanned(&mut self.session, line) {
                Ok(update) => console.say(format!(
                    "{}: {}  (total {})",
                    update.name,
                    update.notice,
                    self.app.money(update.cart.total_cents)
                ))?,
                Err(e) => console.say(e)?,
            },
            DispatchEvent::Candidates { query, products } => {
                console.say(format!("Matches for '{query}':"))?;
                let dtos: Vec<ProductDto> = products.iter().cloned().map(ProductDto::from).collect();
                console.say(render::products(self.app, &dtos))?;
                console.say(":pick <n> to add")?;
                self.candidates = products;
            }
            DispatchEvent::NotFound { query } => {
                console.say(format!("No product matches '{query}'"))?
            }
            DispatchEvent::LookupFailed { query, message } => {
                console.say(format!("Lookup failed for '{query}': {message}"))?
            }
            DispatchEvent::ReassertFocus => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::console::testing::{output, scripted};
    use super::super::test_support::app;
    use super::*;
    use std::time::Duration;
    use tally_core::{CustomerDraft, ProductDraft};

    async fn stocked_app() -> App {
        let app = app().await;
        app.db
            .inner()
            .products()
            .insert(
                &ProductDraft {
                    name: "Water".to_string(),
                    barcode: Some("123".to_string()),
                    price_cents: 999,
                    cost_cents: None,
                },
                2,
            )
            .await
            .unwrap();
        app.db
            .inner()
            .customers()
            .insert(&CustomerDraft {
                name: "Ana".to_string(),
                email: None,
                phone: None,
            })
            .await
            .unwrap();
        app
    }

    /// Next non-focus event.
    async fn next_result(events: &mut mpsc::Receiver<DispatchEvent>) -> DispatchEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            if event != DispatchEvent::ReassertFocus {
                return event;
            }
        }
    }

    async fn scan<W: Write>(
        screen: &mut Screen<'_>,
        events: &mut mpsc::Receiver<DispatchEvent>,
        console: &mut Console<W>,
        text: &str,
    ) {
        screen.handle_line(console, text).await.unwrap();
        let event = next_result(events).await;
        screen.apply_event(console, event).unwrap();
    }

    #[tokio::test]
    async fn test_scans_fill_cart_up_to_stock() {
        let app = stocked_app().await;
        let (mut screen, mut events) = Screen::new(&app);
        let mut console = scripted(&[]);

        for _ in 0..3 {
            scan(&mut screen, &mut events, &mut console, "123").await;
        }

        assert_eq!(screen.session.cart().total_quantity(), 2);
        let out = output(console);
        assert!(out.contains("Water: Added"));
        assert!(out.contains("Water: Max stock reached"));
    }

    #[tokio::test]
    async fn test_search_then_pick() {
        let app = stocked_app().await;
        let (mut screen, mut events) = Screen::new(&app);
        let mut console = scripted(&[]);

        scan(&mut screen, &mut events, &mut console, "wat").await;
        assert_eq!(screen.candidates.len(), 1);
        assert!(screen.session.cart().is_empty());

        scan(&mut screen, &mut events, &mut console, ":pick 1").await;
        assert_eq!(screen.session.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_text_reports_not_found() {
        let app = stocked_app().await;
        let (mut screen, mut events) = Screen::new(&app);
        let mut console = scripted(&[]);

        scan(&mut screen, &mut events, &mut console, "bread").await;
        assert!(output(console).contains("No product matches 'bread'"));
    }

    #[tokio::test]
    async fn test_finalize_requires_customer_then_commits() {
        let app = stocked_app().await;
        let (mut screen, mut events) = Screen::new(&app);
        let mut console = scripted(&[]);

        scan(&mut screen, &mut events, &mut console, "123").await;
        screen.handle_line(&mut console, ":done").await.unwrap();
        assert_eq!(screen.session.cart().len(), 1);

        screen.handle_line(&mut console, ":customer 1").await.unwrap();
        screen.handle_line(&mut console, ":done").await.unwrap();

        assert!(screen.session.cart().is_empty());
        assert!(matches!(
            screen.session.phase(),
            CheckoutPhase::Committed { .. }
        ));
        assert_eq!(app.db.inner().sales().count().await.unwrap(), 1);

        let out = output(console);
        assert!(out.contains("[VALIDATION_ERROR] Choose a customer first"));
        assert!(out.contains("Customer: Ana"));
        assert!(out.contains("TOTAL $9.99"));
    }

    #[tokio::test]
    async fn test_qty_and_rm_commands() {
        let app = stocked_app().await;
        let (mut screen, mut events) = Screen::new(&app);
        let mut console = scripted(&[]);

        scan(&mut screen, &mut events, &mut console, "123").await;
        screen.handle_line(&mut console, ":qty 1 5").await.unwrap();
        assert_eq!(screen.session.cart().total_quantity(), 2);

        screen.handle_line(&mut console, ":qty one").await.unwrap();
        screen.handle_line(&mut console, ":rm 1").await.unwrap();
        assert!(screen.session.cart().is_empty());

        let out = output(console);
        assert!(out.contains("Water: Quantity set to 2"));
        assert!(out.contains("Usage: :qty <line> <quantity>"));
    }

    #[tokio::test]
    async fn test_search_mode_toggles_focus_lock() {
        let app = stocked_app().await;
        let (mut screen, _events) = Screen::new(&app);
        let mut console = scripted(&[]);

        screen.handle_line(&mut console, ":search on").await.unwrap();
        assert!(!screen.keeper.focus_lock());
        screen.handle_line(&mut console, ":search off").await.unwrap();
        assert!(screen.keeper.focus_lock());
    }

    #[tokio::test]
    async fn test_quit_leaves_and_stops_keeper() {
        let app = stocked_app().await;
        let mut console = scripted(&[":help", ":quit"]);

        run(&app, &mut console).await.unwrap();

        let out = output(console);
        assert!(out.contains("--- Checkout ---"));
        assert!(out.contains(":done"));
    }
}
