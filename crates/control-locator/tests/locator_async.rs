//! Async locate surface over in-memory pages.

use std::sync::Arc;
use std::time::Duration;

use control_locator::{
    ControlCategory, ControlKind, ControlLocator, FoundType, LocatorConfig, LocatorError,
    NodeCategory, NodeId, PageLocator, PageTree, StaticPage,
};

/// Page whose child lookups take a while
struct SlowPage {
    inner: StaticPage,
    delay: Duration,
}

impl PageTree for SlowPage {
    fn root(&self) -> NodeId {
        self.inner.root()
    }

    fn category(&self, node: NodeId) -> NodeCategory {
        self.inner.category(node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.inner.attribute(node, name)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.inner.text(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        std::thread::sleep(self.delay);
        self.inner.children(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }

    fn is_displayed(&self, node: NodeId) -> bool {
        self.inner.is_displayed(node)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.element_by_id(id)
    }

    fn frame_content(&self, node: NodeId) -> Option<NodeId> {
        self.inner.frame_content(node)
    }

    fn describe(&self, node: NodeId) -> String {
        self.inner.describe(node)
    }
}

const LOGIN: &str = "<form>\
    <p>Username</p><input id='user' name='user' type='text'>\
    <p>Password</p><input id='pass' name='pass' type='password'>\
    <input id='login' type='submit' value='Log in'>\
    </form>";

#[tokio::test]
async fn locate_fields_of_a_form() -> anyhow::Result<()> {
    let locator = PageLocator::new(Arc::new(StaticPage::from_html(LOGIN)))?;

    let user = locator.locate(ControlCategory::Settable, "Username").await?;
    let best = user.best.expect("username field");
    assert_eq!(best.control.kind(), ControlKind::TextField);
    assert_eq!(best.found_type, FoundType::ByLabelingText);

    let pass = locator.locate(ControlCategory::Settable, "Password").await?;
    assert_eq!(pass.best.expect("password field").control.kind(), ControlKind::PasswordField);

    let button = locator.locate(ControlCategory::Clickable, "Log in").await?;
    assert_eq!(button.best.expect("button").control.kind(), ControlKind::InputButton);
    Ok(())
}

#[tokio::test]
async fn no_match_is_not_an_error() -> anyhow::Result<()> {
    let locator = PageLocator::new(Arc::new(StaticPage::from_html(LOGIN)))?;
    let outcome = locator.locate(ControlCategory::Settable, "Nothing like it").await?;
    assert!(outcome.best.is_none());
    assert!(outcome.ranked.is_empty());
    Ok(())
}

#[tokio::test]
async fn custom_separator() -> anyhow::Result<()> {
    let config = LocatorConfig::default().with_path_separator('/');
    let locator = PageLocator::with_config(Arc::new(StaticPage::from_html(LOGIN)), config)?;
    let outcome = locator.locate(ControlCategory::Settable, "Username / Password").await?;
    assert_eq!(outcome.best.expect("password field").control.kind(), ControlKind::PasswordField);
    Ok(())
}

#[tokio::test]
async fn candidates_are_ranked() -> anyhow::Result<()> {
    let locator = PageLocator::new(Arc::new(StaticPage::from_html(
        "<a id='a1' href='#'>Read more</a><a id='more' href='#'>Next</a>",
    )))?;
    let list = locator.candidates(ControlCategory::Clickable, "more").await?;
    let sorted = list.entries_sorted();
    assert_eq!(sorted.len(), 2);
    assert_eq!(sorted[0].found_type, FoundType::ById);
    assert_eq!(sorted[1].found_type, FoundType::ByLabel);
    Ok(())
}

#[tokio::test]
async fn slow_page_times_out() -> anyhow::Result<()> {
    let page = SlowPage {
        inner: StaticPage::from_html("<input id='a' name='field' type='text'>"),
        delay: Duration::from_millis(20),
    };
    let config = LocatorConfig::default().with_locate_timeout(Duration::from_millis(1));
    let locator = PageLocator::with_config(Arc::new(page), config)?;

    let error = locator
        .locate(ControlCategory::Settable, "field")
        .await
        .expect_err("locate should time out");
    assert!(matches!(error, LocatorError::Timeout(_)));
    assert!(error.is_retryable());
    Ok(())
}

#[test]
fn json_config_drives_locate() {
    let config = tokio_test::assert_ok!(LocatorConfig::from_json_str(
        r#"{"path_separator": "/", "parallel_threshold": 1}"#
    ));
    let locator = tokio_test::assert_ok!(PageLocator::with_config(
        Arc::new(StaticPage::from_html(LOGIN)),
        config
    ));

    let outcome = tokio_test::assert_ok!(tokio_test::block_on(
        locator.locate(ControlCategory::Settable, "Password / pass")
    ));
    let best = outcome.best.expect("password field");
    assert_eq!(best.control.kind(), ControlKind::PasswordField);
    assert_eq!(best.found_type, FoundType::ById);
}
