//! The demo page.

use std::time::Duration;

use futures_util::stream;
use interest_html::{close, jsx, open, Content, Props, Tag};

const FRUITS: [&str; 4] = ["TSX", "Apple", "Banana", "Cherry"];
const FRUIT_DELAY: Duration = Duration::from_millis(500);

/// An ordered list whose items show up one every 500ms.
fn fruits(_props: Props) -> Content {
    let items = std::iter::once(Content::from(open("ol")))
        .chain(FRUITS.map(|fruit| Content::from(jsx("li", Props::new().child(fruit)))))
        .chain(std::iter::once(Content::from(close("ol"))));

    Content::sequence(stream::unfold(
        (items, false),
        |(mut items, started)| async move {
            let item = items.next()?;
            // The open tag goes out right away; every item after it waits.
            if started {
                tokio::time::sleep(FRUIT_DELAY).await;
            }
            Some((Ok(item), (items, true)))
        },
    ))
}

pub fn page() -> Content {
    jsx(
        Tag::Fragment,
        Props::new()
            .child(jsx("h1", Props::new().child("JSX Page")))
            .child(jsx(
                "p",
                Props::new().attr("class", "oh hey").child("meowing chunk by chunk"),
            ))
            .child(jsx(Tag::component(fruits), Props::new())),
    )
    .into()
}
