/**
Texel extents.  Every region a stream writes is anchored at texel (0,0):

```text
           x
      0 ────────▶
      │ ┌───┬───┐
    y │ │ ▒ │   │
      │ ├───┘   │
      │ │       │
      ▼ └───────┘
 ```

so a region is fully described by its width and height.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub width: u16,
    pub height: u16,
}

impl Extent {
    pub const fn new(width: u16, height: u16) -> Self {
        Extent { width, height }
    }

    pub const fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    ///The smallest extent covering both.
    pub fn union(self, other: Extent) -> Extent {
        Extent {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    pub const fn fits_within(&self, outer: Extent) -> bool {
        self.width <= outer.width && self.height <= outer.height
    }

    ///True when `self` is narrower or shorter than `other`.
    pub const fn smaller_in_either(&self, other: Extent) -> bool {
        self.width < other.width || self.height < other.height
    }
}

#[cfg(test)]
mod tests {
    use super::Extent;

    #[test]
    fn union_is_componentwise() {
        assert_eq!(Extent::new(4, 1).union(Extent::new(2, 3)), Extent::new(4, 3));
    }

    #[test]
    fn shrinking_in_one_dimension_counts() {
        let last = Extent::new(4, 4);
        assert!(Extent::new(4, 2).smaller_in_either(last));
        assert!(Extent::new(2, 8).smaller_in_either(last));
        assert!(!Extent::new(4, 4).smaller_in_either(last));
        assert!(!Extent::new(5, 4).smaller_in_either(last));
    }
}
