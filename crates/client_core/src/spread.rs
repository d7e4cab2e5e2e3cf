//! Pairing of right-to-left page images into one- or two-page spreads.
//!
//! With single-first-page mode on, spread 0 shows image 0 alone and every
//! later spread `p` starts at image `2p - 1`. With it off, spread `p` starts at
//! image `2p`. Spreads are derived on demand from the image count and the mode
//! and never stored.

/// One screen of the reader. `right` is the lower image index, which is read
/// first in right-to-left order; `left` is the page after it, when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread {
    pub index: usize,
    pub right: Option<usize>,
    pub left: Option<usize>,
}

impl Spread {
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        self.right.into_iter().chain(self.left)
    }

    pub fn contains(&self, image: usize) -> bool {
        self.right == Some(image) || self.left == Some(image)
    }

    pub fn is_empty(&self) -> bool {
        self.right.is_none() && self.left.is_none()
    }
}

/// Number of spreads for `image_count` images.
///
/// In single-first-page mode an empty chapter still has one (empty) spread.
pub fn spread_count(image_count: usize, single_first_page: bool) -> usize {
    if single_first_page {
        (image_count + 2) / 2
    } else {
        (image_count + 1) / 2
    }
}

pub fn first_image_index(spread: usize, single_first_page: bool) -> usize {
    if single_first_page && spread > 0 {
        spread * 2 - 1
    } else {
        spread * 2
    }
}

pub fn spread_at(image_count: usize, single_first_page: bool, index: usize) -> Option<Spread> {
    if index >= spread_count(image_count, single_first_page) {
        return None;
    }

    let first = first_image_index(index, single_first_page);
    let right = (first < image_count).then_some(first);
    let left = if index == 0 && single_first_page {
        None
    } else {
        (first + 1 < image_count).then_some(first + 1)
    };

    Some(Spread { index, right, left })
}

pub fn spreads(image_count: usize, single_first_page: bool) -> impl Iterator<Item = Spread> {
    (0..spread_count(image_count, single_first_page))
        .filter_map(move |index| spread_at(image_count, single_first_page, index))
}

pub fn spread_of_image(image_count: usize, single_first_page: bool, image: usize) -> Option<usize> {
    if image >= image_count {
        return None;
    }
    if single_first_page {
        Some((image + 1) / 2)
    } else {
        Some(image / 2)
    }
}

/// Spread to show after the mode was flipped to `single_first_page`, given the
/// spread shown before the flip. The new spread shares one image with the old
/// one.
pub fn index_after_toggle(last_spread: usize, single_first_page: bool) -> usize {
    if single_first_page || last_spread == 0 {
        last_spread
    } else {
        last_spread - 1
    }
}

#[cfg(test)]
#[path = "tests/spread_tests.rs"]
mod tests;
