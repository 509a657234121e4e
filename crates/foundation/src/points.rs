use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ids::PointId;
use crate::math::Coordinate;

/// A recorded find: the unit the clusterer and the marker layer operate on.
///
/// Coordinates are trusted. Out-of-range or non-finite values are a contract
/// violation by whoever produced the snapshot and are not checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub id: PointId,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub category: Category,
}

impl GeoPoint {
    pub fn new(id: impl Into<PointId>, coordinate: Coordinate, category: Category) -> Self {
        Self {
            id: id.into(),
            coordinate,
            category,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Mushroom,
    Berry,
    Other,
}

macro_rules! categories {
    ($($variant:ident => $tag:literal, $kind:ident;)*) => {
        /// Foraging type of a find. Only used for marker styling and filtering.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub enum Category {
            $($variant,)*
            #[default]
            Other,
        }

        impl Category {
            pub const ALL: &'static [Category] = &[$(Category::$variant,)* Category::Other];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Category::$variant => $tag,)*
                    Category::Other => "other",
                }
            }

            pub fn kind(self) -> CategoryKind {
                match self {
                    $(Category::$variant => CategoryKind::$kind,)*
                    Category::Other => CategoryKind::Other,
                }
            }

            /// Parses a storage tag. Unknown tags map to `Other`.
            pub fn from_tag(tag: &str) -> Category {
                match tag {
                    $($tag => Category::$variant,)*
                    _ => Category::Other,
                }
            }
        }
    };
}

categories! {
    BayBolete => "bay_bolete", Mushroom;
    BlackCurrant => "black_currant", Berry;
    BlackTrumpet => "black_trumpet", Mushroom;
    Blackberry => "blackberry", Berry;
    Blueberry => "blueberry", Berry;
    Chanterelle => "chanterelle", Mushroom;
    Cloudberry => "cloudberry", Berry;
    Cranberry => "cranberry", Berry;
    Elderberry => "elderberry", Berry;
    FieldMushroom => "field_mushroom", Mushroom;
    GenericBerry => "generic_berry", Berry;
    GenericMushroom => "generic_mushroom", Mushroom;
    HedgehogMushroom => "hedgehog_mushroom", Mushroom;
    Lingonberry => "lingonberry", Berry;
    Oyster => "oyster", Mushroom;
    ParasolMushroom => "parasol_mushroom", Mushroom;
    Porcini => "porcini", Mushroom;
    Raspberry => "raspberry", Berry;
    RedCurrant => "red_currant", Berry;
    Rosehip => "rosehip", Berry;
    Seabuckthorn => "seabuckthorn", Berry;
    SheathedWoodtuft => "sheathed_woodtuft", Mushroom;
    Sloe => "sloe", Berry;
    WildStrawberry => "wild_strawberry", Berry;
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Category::from_tag(&tag))
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryKind, GeoPoint};

    #[test]
    fn tags_are_stable() {
        for c in Category::ALL {
            assert_eq!(Category::from_tag(c.as_str()), *c);
        }
        assert_eq!(Category::ALL.len(), 25);
    }

    #[test]
    fn unknown_tag_is_other() {
        assert_eq!(Category::from_tag("truffle"), Category::Other);
        assert_eq!(Category::Chanterelle.kind(), CategoryKind::Mushroom);
        assert_eq!(Category::Cloudberry.kind(), CategoryKind::Berry);
    }

    #[test]
    fn point_reads_from_json() {
        let p: GeoPoint = serde_json::from_str(
            r#"{"id":"a1","coordinate":{"latitude":56.1,"longitude":9.5},"category":"porcini"}"#,
        )
        .expect("json");
        assert_eq!(p.id.as_str(), "a1");
        assert_eq!(p.category, Category::Porcini);

        let missing: GeoPoint =
            serde_json::from_str(r#"{"id":"b","coordinate":{"latitude":0,"longitude":0}}"#)
                .expect("json");
        assert_eq!(missing.category, Category::Other);
    }
}
