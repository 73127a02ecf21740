//! The caller-owned, ordered list of images awaiting conversion.
//!
//! The list order is the page order. Entries are addressed by their
//! [`LoadedImage::id`] for removal and single-step moves, or by index for
//! drag-and-drop style reordering.

use crate::pipeline::acquire::LoadedImage;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList {
    items: Vec<LoadedImage>,
}

impl ImageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one image at the end.
    pub fn push(&mut self, image: LoadedImage) {
        self.items.push(image);
    }

    /// Insert at `index`, or append when `index` is past the end.
    pub fn insert(&mut self, index: usize, image: LoadedImage) {
        let index = index.min(self.items.len());
        self.items.insert(index, image);
    }

    /// Remove the image with `id`, returning it if present.
    pub fn remove(&mut self, id: Uuid) -> Option<LoadedImage> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Take the image at `from` out of the list and re-insert it at `to`.
    ///
    /// Indices past the end are clamped to the last position. `to` is
    /// interpreted after the removal, so `move_item(0, 2)` on `[a, b, c]`
    /// gives `[b, c, a]`.
    pub fn move_item(&mut self, from: usize, to: usize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        let moved = self.items.remove(from.min(last));
        self.items.insert(to.min(last), moved);
    }

    /// Swap the image with its predecessor. Returns false if it was
    /// already first or is not in the list.
    pub fn move_up(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(i) if i > 0 => {
                self.move_item(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap the image with its successor. Returns false if it was already
    /// last or is not in the list.
    pub fn move_down(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(i) if i + 1 < self.items.len() => {
                self.move_item(i, i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&LoadedImage> {
        self.items.iter().find(|img| img.id == id)
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|img| img.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadedImage> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[LoadedImage] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<LoadedImage> {
        self.items
    }
}

impl Extend<LoadedImage> for ImageList {
    fn extend<T: IntoIterator<Item = LoadedImage>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl From<Vec<LoadedImage>> for ImageList {
    fn from(items: Vec<LoadedImage>) -> Self {
        Self { items }
    }
}

impl FromIterator<LoadedImage> for ImageList {
    fn from_iter<T: IntoIterator<Item = LoadedImage>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ImageList {
    type Item = &'a LoadedImage;
    type IntoIter = std::slice::Iter<'a, LoadedImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl AsRef<[LoadedImage]> for ImageList {
    fn as_ref(&self) -> &[LoadedImage] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn image(name: &str) -> LoadedImage {
        LoadedImage {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mime_type: "image/png".into(),
            src: Arc::from("data:image/png;base64,"),
            width: 1,
            height: 1,
        }
    }

    fn names(list: &ImageList) -> Vec<&str> {
        list.iter().map(|i| i.name.as_str()).collect()
    }

    fn abc() -> ImageList {
        ["a", "b", "c"].into_iter().map(image).collect()
    }

    #[test]
    fn move_item_uses_splice_semantics() {
        let mut list = abc();
        list.move_item(0, 2);
        assert_eq!(names(&list), ["b", "c", "a"]);

        let mut list = abc();
        list.move_item(2, 0);
        assert_eq!(names(&list), ["c", "a", "b"]);

        let mut list = abc();
        list.move_item(1, 1);
        assert_eq!(names(&list), ["a", "b", "c"]);
    }

    #[test]
    fn move_item_clamps_out_of_range() {
        let mut list = abc();
        list.move_item(9, 0);
        assert_eq!(names(&list), ["c", "a", "b"]);

        let mut list = abc();
        list.move_item(0, 99);
        assert_eq!(names(&list), ["b", "c", "a"]);

        let mut empty = ImageList::new();
        empty.move_item(0, 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn move_up_and_down_by_id() {
        let mut list = abc();
        let b = list.as_slice()[1].id;
        assert!(list.move_up(b));
        assert_eq!(names(&list), ["b", "a", "c"]);
        assert!(!list.move_up(b), "already first");

        assert!(list.move_down(b));
        assert!(list.move_down(b));
        assert_eq!(names(&list), ["a", "c", "b"]);
        assert!(!list.move_down(b), "already last");
        assert!(!list.move_down(Uuid::new_v4()));
    }

    #[test]
    fn remove_and_insert() {
        let mut list = abc();
        let b = list.as_slice()[1].clone();
        assert_eq!(list.remove(b.id), Some(b.clone()));
        assert_eq!(list.remove(b.id), None);
        assert_eq!(names(&list), ["a", "c"]);

        list.insert(1, b);
        list.insert(42, image("z"));
        assert_eq!(names(&list), ["a", "b", "c", "z"]);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn get_and_extend() {
        let mut list = ImageList::new();
        list.push(image("first"));
        list.extend(vec![image("second"), image("third")]);
        let id = list.as_slice()[2].id;
        assert_eq!(list.get(id).map(|i| i.name.as_str()), Some("third"));
        assert_eq!(list.position(id), Some(2));
        assert_eq!(list.into_vec().len(), 3);
    }
}
