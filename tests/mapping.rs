mod resource {
    pub mod garage;
}

#[cfg(test)]
mod tests {
    use crate::resource::garage::{Car, Lap, Manufacturer, Ticket};
    use rivet::{
        Accessor, Definition, EntityRef, EntityType, ErrorKind, FieldSpec, FieldType, Mapping,
        RelationKind, RelationSpec, RelationTarget, Sequence, Value, conditions,
    };

    fn invalid<E: EntityType>() -> bool {
        let error = Mapping::of::<E>().expect_err("The mapping must be rejected");
        matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::InvalidArgument(..))
        )
    }

    #[test]
    fn fields_and_identifier() {
        let mapping = Mapping::of::<Manufacturer>().expect("Valid mapping");
        assert_eq!(mapping.table(), "manufacturer");
        assert_eq!(mapping.entity(), &EntityRef::of::<Manufacturer>());
        assert_eq!(
            mapping.fields().keys().collect::<Vec<_>>(),
            ["id", "name", "stock_price", "founding_year"]
        );
        assert_eq!(mapping.identifier(), ["id"]);
        let sequence = mapping.sequence().expect("id is a sequence");
        assert_eq!(sequence.name, "id");
        assert_eq!(sequence.sequence, Sequence::Auto);
        assert_eq!(mapping.sequence_name(), None);
        let price = mapping.field("stock_price").unwrap();
        assert_eq!(price.field_type, FieldType::Decimal);
        assert!(price.default_value().is_null());
        assert_eq!(
            mapping.field("founding_year").unwrap().default_value(),
            Value::Int32(Some(1900))
        );
        assert!(mapping.field("name").unwrap().require);
        assert_eq!(mapping.mapper_kind(), None);

        let laps = Mapping::of::<Lap>().unwrap();
        assert_eq!(laps.identifier(), ["driver_id", "number"]);
        assert!(laps.sequence().is_none());

        let tickets = Mapping::of::<Ticket>().unwrap();
        assert_eq!(tickets.sequence_name(), Some("ticket_code_seq"));
        assert_eq!(tickets.field("holder").unwrap().label(), "Ticket holder");
        assert_eq!(tickets.field("issued").unwrap().label(), "issued");
        assert_eq!(Ticket::name(), "Ticket");
    }

    #[test]
    fn relations() {
        let mapping = Mapping::of::<Car>().unwrap();
        let manufacturer = mapping.relation("manufacturer").unwrap();
        assert_eq!(manufacturer.kind, RelationKind::One);
        assert_eq!(
            manufacturer.target,
            RelationTarget::Type(EntityRef::of::<Manufacturer>())
        );
        assert_eq!(
            manufacturer.conditions,
            conditions! { "id" => "this.manufacturer_id" }
        );
        assert!(manufacturer.through.is_none());
        let drivers = mapping.relation("drivers").unwrap();
        assert_eq!(drivers.kind, RelationKind::Many);
        assert_eq!(drivers.target, RelationTarget::Named("Driver".into()));
        assert_eq!(
            drivers.through,
            Some(("car_driver".into(), "driver_id".into()))
        );
        assert_eq!(drivers.field, "id");
    }

    #[test]
    fn accessors() {
        let mapping = Mapping::of::<Manufacturer>().unwrap();
        assert_eq!(
            mapping.accessor("getFoundingYear"),
            Some(&Accessor::Get("founding_year".into()))
        );
        assert_eq!(
            mapping.accessor("isStockPrice"),
            Some(&Accessor::Is("stock_price".into()))
        );
        assert_eq!(
            mapping.accessor("setName"),
            Some(&Accessor::Set("name".into()))
        );
        assert_eq!(
            mapping.accessor("getCars"),
            Some(&Accessor::Get("cars".into()))
        );
        assert_eq!(mapping.accessor("isCars"), Some(&Accessor::Is("cars".into())));
        assert_eq!(mapping.accessor("setCars"), None);
        assert_eq!(mapping.accessor("getfoundingyear"), None);

        struct Firmware;
        impl EntityType for Firmware {
            fn definition() -> Definition {
                Definition::new("firmware")
                    .field("id", FieldSpec::new("integer").primary())
                    .field("md5sum", "string")
                    .field("build_2024", "string")
            }
        }
        let mapping = Mapping::of::<Firmware>().unwrap();
        assert_eq!(
            mapping.accessor("getMd5sum"),
            Some(&Accessor::Get("md5sum".into()))
        );
        assert_eq!(mapping.accessor("getMd5Sum"), None);
        assert_eq!(
            mapping.accessor("setBuild2024"),
            Some(&Accessor::Set("build_2024".into()))
        );
    }

    #[test]
    fn rejected_definitions() {
        struct NoTable;
        impl EntityType for NoTable {
            fn definition() -> Definition {
                Definition::new("").field("id", "integer")
            }
        }
        assert!(invalid::<NoTable>());

        struct UnknownType;
        impl EntityType for UnknownType {
            fn definition() -> Definition {
                Definition::new("unknown").field("id", "int128")
            }
        }
        assert!(invalid::<UnknownType>());

        struct TwoSequences;
        impl EntityType for TwoSequences {
            fn definition() -> Definition {
                Definition::new("two")
                    .field("id", FieldSpec::new("integer").sequence())
                    .field("serial", FieldSpec::new("integer").sequence_named("serial_seq"))
            }
        }
        assert!(invalid::<TwoSequences>());

        struct Clash;
        impl EntityType for Clash {
            fn definition() -> Definition {
                Definition::new("clash").field("car", "integer").relation(
                    "car",
                    RelationSpec::one::<Car>(conditions! { "id" => "this.car" }),
                )
            }
        }
        assert!(invalid::<Clash>());

        struct Template;
        impl EntityType for Template {
            fn definition() -> Definition {
                Definition::new("template").field("id", "integer").relation(
                    "cars",
                    RelationSpec::many::<Car>(conditions! {
                        "or" => { "manufacturer_id" => "this.maker" },
                    }),
                )
            }
        }
        assert!(invalid::<Template>());

        struct Through;
        impl EntityType for Through {
            fn definition() -> Definition {
                Definition::new("through").field("id", "integer").relation(
                    "cars",
                    RelationSpec::many::<Car>(conditions! { "owner_id" => "this.id" })
                        .through("ownership"),
                )
            }
        }
        assert!(invalid::<Through>());

        struct Tags;
        impl EntityType for Tags {
            fn definition() -> Definition {
                Definition::new("tags")
                    .field("a", "INTEGER")
                    .field("b", "Text")
                    .field("c", "guid")
            }
        }
        let tags = Mapping::of::<Tags>().expect("Type tags are case insensitive");
        assert!(tags.identifier().is_empty());
        assert_eq!(tags.field("b").unwrap().field_type, FieldType::Text);
    }
}
