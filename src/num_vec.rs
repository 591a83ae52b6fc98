use core::fmt;
use core::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};




/**
 * A statically-sized numeric vector over a generic scalar data type T, which
 * supports arithmetic operations also supported by T.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Vector<T, const DIM: usize> {
    data: [T; DIM]
}




// ============================================================================
impl<T, const DIM: usize> Vector<T, DIM> {

    pub const fn new(data: [T; DIM]) -> Self {
        Self { data }
    }

    pub fn splat(value: T) -> Self where T: Copy {
        Self { data: [value; DIM] }
    }

    pub fn as_array(&self) -> &[T; DIM] {
        &self.data
    }

    pub fn into_array(self) -> [T; DIM] {
        self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Vector<U, DIM> {
        Vector { data: self.data.map(f) }
    }

    /**
     * Component-wise product of two vectors.
     */
    pub fn component_mul<U, V>(self, other: Vector<U, DIM>) -> Vector<V, DIM>
    where
        T: Copy + Mul<U, Output = V>,
        U: Copy,
    {
        Vector { data: core::array::from_fn(|i| self[i] * other[i]) }
    }
}




/**
 * Integer reductions and comparisons. Comparisons are component-wise: a
 * vector is less than another iff all of its components are.
 */
impl<const DIM: usize> Vector<i64, DIM> {

    pub fn zero() -> Self {
        Self::splat(0)
    }

    pub fn unit(dir: usize) -> Self {
        let mut v = Self::zero();
        v[dir] = 1;
        v
    }

    pub fn sum(&self) -> i64 {
        self.data.iter().sum()
    }

    pub fn product(&self) -> i64 {
        self.data.iter().product()
    }

    pub fn min(&self) -> i64 {
        self.data.iter().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> i64 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    pub fn argmin(&self) -> usize {
        (0..DIM).min_by_key(|&i| self.data[i]).unwrap_or(0)
    }

    pub fn argmax(&self) -> usize {
        (0..DIM).max_by_key(|&i| self.data[i]).unwrap_or(0)
    }

    pub fn abs(&self) -> Self {
        self.map(i64::abs)
    }

    pub fn all_lt(&self, other: &Self) -> bool {
        self.data.iter().zip(&other.data).all(|(a, b)| a < b)
    }

    pub fn all_le(&self, other: &Self) -> bool {
        self.data.iter().zip(&other.data).all(|(a, b)| a <= b)
    }

    pub fn component_min(&self, other: &Self) -> Self {
        Self { data: core::array::from_fn(|i| self[i].min(other[i])) }
    }

    pub fn component_max(&self, other: &Self) -> Self {
        Self { data: core::array::from_fn(|i| self[i].max(other[i])) }
    }
}




// ============================================================================
impl<T, U, V, const DIM: usize> Add<Vector<U, DIM>> for Vector<T, DIM>
where
    T: Copy + Add<U, Output = V>,
    U: Copy,
{
    type Output = Vector<V, DIM>;

    fn add(self, other: Vector<U, DIM>) -> Self::Output {
        Vector { data: core::array::from_fn(|i| self[i].add(other[i])) }
    }
}

impl<T, U, V, const DIM: usize> Sub<Vector<U, DIM>> for Vector<T, DIM>
where
    T: Copy + Sub<U, Output = V>,
    U: Copy,
{
    type Output = Vector<V, DIM>;

    fn sub(self, other: Vector<U, DIM>) -> Self::Output {
        Vector { data: core::array::from_fn(|i| self[i].sub(other[i])) }
    }
}

impl<T, U, V, const DIM: usize> Mul<U> for Vector<T, DIM>
where
    T: Copy + Mul<U, Output = V>,
    U: Copy,
{
    type Output = Vector<V, DIM>;

    fn mul(self, other: U) -> Self::Output {
        Vector { data: core::array::from_fn(|i| self[i].mul(other)) }
    }
}

impl<T, U, V, const DIM: usize> Div<U> for Vector<T, DIM>
where
    T: Copy + Div<U, Output = V>,
    U: Copy,
{
    type Output = Vector<V, DIM>;

    fn div(self, other: U) -> Self::Output {
        Vector { data: core::array::from_fn(|i| self[i].div(other)) }
    }
}

impl<T, V, const DIM: usize> Neg for Vector<T, DIM>
where
    T: Copy + Neg<Output = V>,
{
    type Output = Vector<V, DIM>;

    fn neg(self) -> Self::Output {
        Vector { data: core::array::from_fn(|i| -self[i]) }
    }
}




// ============================================================================
impl<T, const DIM: usize> Index<usize> for Vector<T, DIM> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T, const DIM: usize> IndexMut<usize> for Vector<T, DIM> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Default, const DIM: usize> Default for Vector<T, DIM> {
    fn default() -> Self {
        Self { data: core::array::from_fn(|_| T::default()) }
    }
}

impl<T, const DIM: usize> From<[T; DIM]> for Vector<T, DIM> {
    fn from(data: [T; DIM]) -> Self {
        Self { data }
    }
}

impl<T: fmt::Display, const DIM: usize> fmt::Display for Vector<T, DIM> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "(")?;
        for (i, x) in self.data.iter().enumerate() {
            if i > 0 {
                write!(fmt, ", ")?;
            }
            write!(fmt, "{}", x)?;
        }
        write!(fmt, ")")
    }
}




// ============================================================================
impl<T: Serialize, const DIM: usize> Serialize for Vector<T, DIM> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.as_slice().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, const DIM: usize> Deserialize<'de> for Vector<T, DIM> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        let len = items.len();
        let data: [T; DIM] = items
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"a sequence matching the vector dimension"))?;
        Ok(Self { data })
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Vector;

    #[test]
    fn arithmetic_is_component_wise() {
        let a = Vector::new([1i64, 2, 3]);
        let b = Vector::new([4i64, 5, 6]);
        assert_eq!(a + b, Vector::new([5, 7, 9]));
        assert_eq!(b - a, Vector::new([3, 3, 3]));
        assert_eq!(a * 2, Vector::new([2, 4, 6]));
        assert_eq!(b / 2, Vector::new([2, 2, 3]));
        assert_eq!(-a, Vector::new([-1, -2, -3]));
        assert_eq!(a.component_mul(b), Vector::new([4, 10, 18]));
    }

    #[test]
    fn reductions_work() {
        let a = Vector::new([3i64, -7, 5]);
        assert_eq!(a.sum(), 1);
        assert_eq!(a.product(), -105);
        assert_eq!(a.min(), -7);
        assert_eq!(a.max(), 5);
        assert_eq!(a.argmin(), 1);
        assert_eq!(a.argmax(), 2);
        assert_eq!(a.abs(), Vector::new([3, 7, 5]));
        assert_eq!(Vector::<i64, 3>::unit(2), Vector::new([0, 0, 1]));
    }

    #[test]
    fn comparison_requires_every_component() {
        let a = Vector::new([0i64, 0]);
        let b = Vector::new([1i64, 0]);
        assert!(a.all_le(&b));
        assert!(!a.all_lt(&b));
        assert!(!b.all_le(&a));
        assert_eq!(a.component_max(&b), b);
        assert_eq!(a.component_min(&b), a);
    }

    #[test]
    fn vector_displays_as_tuple() {
        assert_eq!(Vector::new([1i64, -2]).to_string(), "(1, -2)");
    }

    #[test]
    fn serialization_checks_length() {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&Vector::new([1i64, 2, 3]), &mut buffer).unwrap();
        let v: Vector<i64, 3> = ciborium::de::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(v, Vector::new([1, 2, 3]));
        let w: Result<Vector<i64, 2>, _> = ciborium::de::from_reader(buffer.as_slice());
        assert!(w.is_err());
    }
}
