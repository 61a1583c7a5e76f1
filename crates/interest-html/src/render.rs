//! The content renderer: writes any [`Content`] into a target in document
//! order.

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use interest_stream::{Result, Seq};
use tracing::trace;

use crate::content::{Content, Drain, Sequence};
use crate::escape::{escape_owned, format_number};
use crate::target::RenderTarget;

/// Render `content` into `target`.
///
/// Completes once everything the content produces in order has been
/// written. A detached sequence at the top level is handed to
/// [`RenderTarget::detach`] and keeps writing after this returns.
pub fn render_content(content: Content, target: RenderTarget) -> BoxFuture<'static, Result<()>> {
    Box::pin(async move {
        match content {
            Content::Empty => Ok(()),
            Content::Text(text) => target.write(escape_owned(text)).await,
            Content::Raw(html) => target.write(html).await,
            Content::Integer(n) => target.write(n.to_string()).await,
            Content::Number(n) => target.write(format_number(n)).await,
            Content::Element(element) => element.render(target).await,
            Content::Future(future) => {
                let resolved = future.await?;
                render_content(resolved, target).await
            }
            Content::List(items) => {
                for item in items {
                    render_content(item, target.clone()).await?;
                }
                Ok(())
            }
            Content::Sequence(seq) => render_sequence(seq, target).await,
        }
    })
}

async fn render_sequence(seq: Sequence, target: RenderTarget) -> Result<()> {
    match seq.drain {
        Drain::Detached if !target.is_nested() => {
            trace!("detaching top-level sequence");
            target.detach(drain_in_order(seq.items, target.clone()));
            Ok(())
        }
        _ => drain_in_order(seq.items, target).await,
    }
}

/// Render each item before requesting the next.
async fn drain_in_order(mut items: Seq<Content>, target: RenderTarget) -> Result<()> {
    while let Some(item) = items.next().await {
        render_content(item?, target.clone()).await?;
    }
    Ok(())
}
