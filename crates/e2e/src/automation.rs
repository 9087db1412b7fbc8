//! Narrow interface to the page under test

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::E2eResult;

/// Operations the executor needs from a browser session.
///
/// Tools, fields and actions are addressed by the names the page uses; an
/// implementation turns them into concrete selectors.
#[async_trait]
pub trait Automation: Send {
    /// Open the page. Failure here is fatal to the whole run.
    async fn load(&mut self, url: &Url) -> E2eResult<()>;

    /// Switch the page to the tool with this activation key
    async fn activate_tool(&mut self, key: &str) -> E2eResult<()>;

    /// Wait until the element is visible, failing after `timeout`
    async fn wait_until_visible(&mut self, selector: &str, timeout: Duration) -> E2eResult<()>;

    /// Type `value` into the input whose id is `field`
    async fn set_field(&mut self, field: &str, value: &str) -> E2eResult<()>;

    /// Trigger the tool's submit action
    async fn submit(&mut self, action: &str) -> E2eResult<()>;

    /// Text content of the result element
    async fn read_result(&mut self) -> E2eResult<String>;

    /// Poll the result element until its text differs from `previous`.
    ///
    /// Running out of time is not an error: the current text is returned.
    async fn wait_for_result_change(
        &mut self,
        previous: &str,
        timeout: Duration,
        poll: Duration,
    ) -> E2eResult<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let current = self.read_result().await?;
            if current != previous || tokio::time::Instant::now() >= deadline {
                return Ok(current);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Tear down the session
    async fn close(&mut self) -> E2eResult<()>;
}
