use migdash::notify::NotificationFeed;

pub mod logs;
pub mod migrate;
pub mod overview;
pub mod pods;
pub mod simulate;
pub mod tee;

/// Prints whatever the forms and views reported since the last call.
pub fn print_notifications(feed: &mut NotificationFeed) {
    for n in feed.drain() {
        println!("{n}");
    }
}
