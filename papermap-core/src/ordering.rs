//! Catalog card ordering: random shuffle on load and "visited first".

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Paper;

/// Shuffle papers in place (Fisher–Yates).
pub fn shuffle_papers<R: Rng + ?Sized>(papers: &mut [Paper], rng: &mut R) {
    papers.shuffle(rng);
}

/// Move papers for which `is_read` holds to the front, keeping the relative
/// order inside both partitions.
pub fn visited_first(papers: &mut Vec<Paper>, is_read: impl Fn(&Paper) -> bool) {
    let (mut read, unread): (Vec<Paper>, Vec<Paper>) =
        papers.drain(..).partition(|paper| is_read(paper));
    read.extend(unread);
    *papers = read;
}
