use std::collections::HashMap;

/// 层配置参数
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Arg {
    Int(i64),
    Str(String),
    Arr(Box<[Self]>),
    Dict(HashMap<String, Self>),
}

macro_rules! impl_from {
    ($( $ty:ty => $variant:ident )+) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from! {
    i64    => Int
    String => Str
        Box<       [Self]> => Arr
    HashMap<String, Self > => Dict
}

impl Arg {
    pub fn int(value: i64) -> Self {
        value.into()
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn arr(value: impl IntoIterator<Item = Self>) -> Self {
        Self::Arr(value.into_iter().collect())
    }

    pub fn dict<K: Into<String>>(value: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Dict(value.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// 从字典中按键取值，非字典时返回 `None`。
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_int().and_then(|val| usize::try_from(val).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&[Self]> {
        match self {
            Self::Arr(val) => Some(val),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Arg;

    #[test]
    fn test_dict() {
        let arg = Arg::dict([
            ("axis", Arg::str("Channels")),
            ("parts", Arg::arr([Arg::int(3), Arg::int(4)])),
        ]);

        assert_eq!(arg.get("axis").and_then(Arg::as_str), Some("Channels"));
        let parts = arg
            .get("parts")
            .and_then(Arg::as_arr)
            .unwrap()
            .iter()
            .map(|p| p.as_int().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(parts, [3, 4]);
        assert!(arg.get("missing").is_none());
    }

    #[test]
    fn test_scalar() {
        assert_eq!(Arg::int(-1).as_usize(), None);
        assert_eq!(Arg::int(7).as_usize(), Some(7));
        assert!(Arg::int(2).get("x").is_none());
        assert!(Arg::int(2).as_arr().is_none());
        assert!(Arg::str("x").as_int().is_none());
    }
}
