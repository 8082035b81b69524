// Implements a num_traits checked-arithmetic trait by forwarding to the
// inherent method of the same name.
macro_rules! checked_impl {
  ($trait_name:ident, $method:ident, $t:ty) => {
    impl num_traits::$trait_name for $t {
      #[inline]
      fn $method(&self, v: &$t) -> Option<$t> {
        <$t>::$method(*self, *v)
      }
    }
  };
  (unary $trait_name:ident, $method:ident, $t:ty) => {
    impl num_traits::$trait_name for $t {
      #[inline]
      fn $method(&self) -> Option<$t> {
        <$t>::$method(*self)
      }
    }
  };
}
