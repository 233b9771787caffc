use super::interpolation::weight;
use itertools::Itertools;
use nalgebra_glm as glm;

/// A timestamped sample of one transform component
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keyframe<T> {
    pub value: T,
    pub time_stamp: f32,
}

pub type KeyPosition = Keyframe<glm::Vec3>;
pub type KeyRotation = Keyframe<glm::Quat>;
pub type KeyScale = Keyframe<glm::Vec3>;

/// Where a track places a given time
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup<'a, T> {
    /// Track has no keys
    Empty,
    /// Track has exactly one key, used for every time
    Single(&'a T),
    /// Interpolate from `from` to `to` by `fraction`
    Between { from: &'a T, to: &'a T, fraction: f32 },
}

/// Keyframes of one kind for one bone, ordered by ascending time stamp
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyframeTrack<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T> KeyframeTrack<T> {
    /// Creates a track. Keys are sorted by time stamp so that importers with
    /// out of order data still produce a valid track.
    #[must_use]
    pub fn new(mut keys: Vec<Keyframe<T>>) -> Self {
        // Since the time stamps are f32, regular `sort` can't be used. The
        // sort is stable so keys sharing a time stamp keep their order.
        keys.sort_by(|a, b| a.time_stamp.total_cmp(&b.time_stamp));
        Self { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time stamp of the last key, or 0 for an empty track
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time_stamp)
    }

    /// Returns the index `i` of the key pair bracketing `animation_time`, so
    /// that `keys[i].time_stamp <= animation_time < keys[i + 1].time_stamp`.
    /// Times outside the keys clamp to the first or last pair. Returns `None`
    /// when the track has fewer than two keys.
    #[must_use]
    pub fn bracket(&self, animation_time: f32) -> Option<usize> {
        if self.keys.len() < 2 {
            return None;
        }
        // First key whose *next* time stamp exceeds the time. Ties go to the
        // earlier key.
        Some(
            self.keys
                .iter()
                .tuple_windows()
                .position(|(_, next)| animation_time < next.time_stamp)
                .unwrap_or(self.keys.len() - 2),
        )
    }

    /// Fraction of the way from key `index` to key `index + 1`, in [0, 1].
    /// Keys with equal time stamps give 0 so the earlier key wins.
    #[must_use]
    pub fn fraction(&self, index: usize, animation_time: f32) -> f32 {
        match (self.keys.get(index), self.keys.get(index + 1)) {
            (Some(from), Some(to)) => {
                weight(from.time_stamp, to.time_stamp, animation_time)
            }
            _ => 0.0,
        }
    }

    /// Finds the keys to interpolate between for a given time
    #[must_use]
    pub fn lookup(&self, animation_time: f32) -> Lookup<'_, T> {
        match self.keys.as_slice() {
            [] => Lookup::Empty,
            [only] => Lookup::Single(&only.value),
            _ => {
                let i = self.bracket(animation_time).unwrap_or(0);
                Lookup::Between {
                    from: &self.keys[i].value,
                    to: &self.keys[i + 1].value,
                    fraction: self.fraction(i, animation_time),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyPosition, KeyframeTrack, Lookup};
    use nalgebra_glm as glm;

    const EPSILON: f32 = 0.0001;

    fn track(times: &[f32]) -> KeyframeTrack<glm::Vec3> {
        KeyframeTrack::new(
            times
                .iter()
                .map(|&t| KeyPosition {
                    value: glm::vec3(t, 0.0, 0.0),
                    time_stamp: t,
                })
                .collect(),
        )
    }

    #[test]
    fn bracket_inside() {
        let t = track(&[0.0, 1.0, 2.0, 4.0]);
        assert_eq!(t.bracket(0.0), Some(0));
        assert_eq!(t.bracket(0.5), Some(0));
        assert_eq!(t.bracket(1.0), Some(1));
        assert_eq!(t.bracket(3.9), Some(2));
    }

    #[test]
    fn bracket_clamps() {
        let t = track(&[1.0, 2.0, 3.0]);
        assert_eq!(t.bracket(-5.0), Some(0));
        assert_eq!(t.bracket(1.0), Some(0));
        assert_eq!(t.bracket(3.0), Some(1));
        assert_eq!(t.bracket(100.0), Some(1));
        assert!((t.fraction(0, -5.0)).abs() < EPSILON);
        assert!((t.fraction(1, 100.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn bracket_short_tracks() {
        assert_eq!(track(&[]).bracket(1.0), None);
        assert_eq!(track(&[2.0]).bracket(1.0), None);
        assert_eq!(track(&[]).lookup(1.0), Lookup::Empty);
        assert!(matches!(track(&[2.0]).lookup(9.0), Lookup::Single(_)));
    }

    #[test]
    fn equal_time_stamps() {
        let t = track(&[0.0, 1.0, 1.0, 2.0]);
        let i = t.bracket(1.0).unwrap();
        assert_eq!(i, 2);
        assert!((t.fraction(1, 1.0)).abs() < EPSILON);
    }

    #[test]
    fn equal_time_stamps_keep_order() {
        let t = KeyframeTrack::new(vec![
            KeyPosition {
                value: glm::vec3(1.0, 0.0, 0.0),
                time_stamp: 1.0,
            },
            KeyPosition {
                value: glm::vec3(0.0, 0.0, 0.0),
                time_stamp: 0.0,
            },
            KeyPosition {
                value: glm::vec3(2.0, 0.0, 0.0),
                time_stamp: 1.0,
            },
        ]);
        let xs: Vec<f32> = t.keys().iter().map(|k| k.value.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn unsorted_keys_are_sorted() {
        let t = track(&[2.0, 0.0, 1.0]);
        let times: Vec<f32> = t.keys().iter().map(|k| k.time_stamp).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert!((t.end_time() - 2.0).abs() < EPSILON);
    }
}
