// Integration tests for the page objects
//
// Drives the screens of a local mock storefront through a real browser.
// Tests skip when the Playwright driver cannot be launched.


use mock_storefront::{LOCKED_OUT_USER, MockStorefront};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_e2e::pages::{
    BACKPACK, BasePage, CartPage, CheckoutCompletePage, CheckoutInformationPage,
    CheckoutOverviewPage, CustomerInfo, InventoryPage, LoginPage,
};
use storefront_e2e::{Credentials, Error, Outcome, Session, Settings, Target};

fn settings(base_url: String, root: &Path) -> Settings {
    Settings {
        base_url,
        headed: false,
        record_video: false,
        record_trace: false,
        video_dir: root.join("videos"),
        trace_dir: root.join("traces"),
        results_dir: root.join("results"),
        report_dir: root.join("report"),
        action_timeout_ms: 3_000,
        ..Settings::default()
    }
}

async fn launch_or_skip(settings: Settings) -> Option<Session> {
    match Session::launch(Arc::new(settings)).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Skipping test: Could not launch browser session: {}", e);
            None
        }
    }
}

fn standard_user() -> Credentials {
    Credentials::new("standard_user", "secret_sauce")
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_reaches_inventory() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();

    let ctx = session.new_test("login reaches inventory").await.unwrap();
    let login = LoginPage::new(ctx.page().clone(), server.url()).with_timeout(timeout);
    login.goto().await.unwrap();
    login.login(&standard_user()).await.unwrap();

    login
        .base()
        .expect_url_matches(&Regex::new(r"inventory\.html").unwrap())
        .await
        .unwrap();
    let inventory = InventoryPage::new(ctx.page().clone()).with_timeout(timeout);
    assert!(inventory.is_displayed().await);
    assert_eq!(inventory.cart_count().await.unwrap(), 0);

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}

#[tokio::test]
async fn test_locked_out_user_sees_error() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();

    let ctx = session.new_test("locked out").await.unwrap();
    let login = LoginPage::new(ctx.page().clone(), server.url()).with_timeout(timeout);
    login.goto().await.unwrap();
    login
        .login(&standard_user().with_username(LOCKED_OUT_USER))
        .await
        .unwrap();

    let text = login.error_text().await.unwrap().unwrap_or_default();
    assert!(text.contains("locked out"), "unexpected error text: {text}");
    assert!(!login.base().url().contains("inventory.html"));

    // Never reaching the inventory surfaces as an assertion error
    let err = InventoryPage::new(ctx.page().clone())
        .with_timeout(timeout)
        .expect_displayed()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Assertion(_)));

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
async fn test_add_item_and_checkout() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();

    let ctx = session.new_test("add item and checkout").await.unwrap();
    let page = ctx.page().clone();

    let login = LoginPage::new(page.clone(), server.url()).with_timeout(timeout);
    login.goto().await.unwrap();
    login.login(&standard_user()).await.unwrap();

    let inventory = InventoryPage::new(page.clone()).with_timeout(timeout);
    inventory.expect_displayed().await.unwrap();
    inventory.add_product(BACKPACK).await.unwrap();
    // The badge renders after a delay; wait for it before counting
    inventory
        .base()
        .expect_visible(&InventoryPage::cart_badge())
        .await
        .unwrap();
    assert_eq!(inventory.cart_count().await.unwrap(), 1);
    inventory.open_cart().await.unwrap();

    let cart = CartPage::new(page.clone()).with_timeout(timeout);
    cart.base()
        .expect_url_contains("cart.html")
        .await
        .unwrap();
    assert_eq!(cart.item_count().await.unwrap(), 1);
    assert!(cart.has_items().await);
    cart.checkout().await.unwrap();

    let info = CustomerInfo::new("John", "Doe", "12345").unwrap();
    CheckoutInformationPage::new(page.clone())
        .with_timeout(timeout)
        .enter_customer_info(&info)
        .await
        .unwrap();
    CheckoutOverviewPage::new(page.clone())
        .with_timeout(timeout)
        .finish()
        .await
        .unwrap();

    let complete = CheckoutCompletePage::new(page.clone()).with_timeout(timeout);
    complete.expect_complete().await.unwrap();
    assert!(complete.is_complete().await);

    complete.back_home().await.unwrap();
    inventory.expect_displayed().await.unwrap();
    assert_eq!(inventory.cart_count().await.unwrap(), 0);

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}

#[tokio::test]
async fn test_cart_count_before_badge_renders_is_zero() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();

    let ctx = session.new_test("late badge").await.unwrap();
    let login = LoginPage::new(ctx.page().clone(), server.url()).with_timeout(timeout);
    login.goto().await.unwrap();
    login.login(&standard_user()).await.unwrap();

    let inventory = InventoryPage::new(ctx.page().clone()).with_timeout(timeout);
    inventory.expect_displayed().await.unwrap();
    inventory.add_product(BACKPACK).await.unwrap();

    // An immediate read races the badge; waiting for it gives the real count
    assert_eq!(inventory.cart_count().await.unwrap(), 0);
    inventory
        .base()
        .expect_visible(&InventoryPage::cart_badge())
        .await
        .unwrap();
    assert_eq!(inventory.cart_count().await.unwrap(), 1);

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}

#[tokio::test]
async fn test_contexts_do_not_share_cart() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();

    for name in ["first shopper", "second shopper"] {
        let ctx = session.new_test(name).await.unwrap();
        let login = LoginPage::new(ctx.page().clone(), server.url()).with_timeout(timeout);
        login.goto().await.unwrap();
        login.login(&standard_user()).await.unwrap();

        let inventory = InventoryPage::new(ctx.page().clone()).with_timeout(timeout);
        inventory.expect_displayed().await.unwrap();
        assert_eq!(inventory.cart_count().await.unwrap(), 0, "{name} saw a stale cart");
        inventory.add_product(BACKPACK).await.unwrap();
        inventory
            .base()
            .expect_visible(&InventoryPage::cart_badge())
            .await
            .unwrap();
        assert_eq!(inventory.cart_count().await.unwrap(), 1);

        ctx.finish(Outcome::Passed).await;
    }

    session.close().await;
    server.shutdown();
}

// ============================================================================
// Timeouts and forced clicks
// ============================================================================

#[tokio::test]
async fn test_screens_use_configured_action_timeout() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let short = Settings {
        action_timeout_ms: 300,
        ..settings(server.url(), root.path())
    };
    let Some(session) = launch_or_skip(short).await else {
        server.shutdown();
        return;
    };
    let timeout = session.settings().action_timeout();
    assert_eq!(timeout, Duration::from_millis(300));

    let ctx = session.new_test("short timeout").await.unwrap();
    let page = ctx.page().clone();
    LoginPage::new(page.clone(), server.url())
        .with_timeout(timeout)
        .goto()
        .await
        .unwrap();

    let inventory = InventoryPage::new(page.clone()).with_timeout(timeout);
    let cart = CartPage::new(page.clone()).with_timeout(timeout);
    let info = CheckoutInformationPage::new(page.clone()).with_timeout(timeout);
    let overview = CheckoutOverviewPage::new(page.clone()).with_timeout(timeout);
    let complete = CheckoutCompletePage::new(page.clone()).with_timeout(timeout);
    for base in [
        inventory.base(),
        cart.base(),
        info.base(),
        overview.base(),
        complete.base(),
    ] {
        assert_eq!(base.timeout(), timeout);
    }

    // None of these screens is showing, so each wait gives up after the
    // configured timeout rather than the 5 s default
    let start = Instant::now();
    assert!(inventory.expect_displayed().await.is_err());
    assert!(cart.checkout().await.is_err());
    assert!(overview.finish().await.is_err());
    assert!(complete.expect_complete().await.is_err());
    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_secs(5), "waits took {elapsed:?}");

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}

#[tokio::test]
async fn test_forced_click_skips_enabled_check() {
    storefront_e2e::logging::init();
    let server = MockStorefront::start().await;
    let root = tempfile::tempdir().unwrap();
    let Some(session) = launch_or_skip(settings(server.url(), root.path())).await else {
        server.shutdown();
        return;
    };

    let ctx = session.new_test("forced click").await.unwrap();
    let base = BasePage::new(ctx.page().clone()).with_timeout(Duration::from_millis(500));
    base.goto(&format!("{}controls.html", server.url()))
        .await
        .unwrap();

    let button = Target::css("#soft-disabled");
    assert!(base.click(&button).await.is_err());
    assert_eq!(base.text(&button).await.unwrap().as_deref(), Some("idle"));

    base.click_forced(&button).await.unwrap();
    assert_eq!(base.text(&button).await.unwrap().as_deref(), Some("clicked"));

    ctx.finish(Outcome::Passed).await;
    session.close().await;
    server.shutdown();
}
