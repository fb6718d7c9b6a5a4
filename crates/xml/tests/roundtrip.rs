// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::any::Any;

use pretty_assertions::assert_eq;
use protean_var::{
    Buffer, DataTable, Error, ExceptionInfo, Object, ObjectRegistry, Tuple, TypedArray, Variant,
    VariantType, temporal, v_bag, v_bool, v_date_time, v_dict, v_double, v_float, v_int32,
    v_int64, v_list, v_none, v_str, v_time, v_uint64,
};
use protean_xml::{XmlMode, XmlReader, from_xml, parse_document, to_xml};
use test_case::test_case;

#[derive(Clone, Debug, Default, PartialEq)]
struct Gauge {
    level: f64,
}

impl Object for Gauge {
    fn name(&self) -> &str {
        "Gauge"
    }

    fn version(&self) -> u32 {
        1
    }

    fn deflate(&self) -> Variant {
        v_dict([("level", v_double(self.level))])
    }

    fn inflate(&mut self, params: &Variant, _version: u32) -> Result<(), Error> {
        self.level = params.at_key("level")?.as_type()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn round_trip(v: &Variant, mode: &XmlMode) -> Variant {
    let xml = to_xml(v, mode).unwrap();
    from_xml(&xml, mode).unwrap()
}

fn sample() -> Variant {
    let t = temporal::parse_date_time("2023-06-01T08:30:00.5").unwrap();
    let mut series = Variant::new(VariantType::TimeSeries).unwrap();
    series.push_back_timed(t, v_int32(1)).unwrap();
    series.push_back_timed(t, v_int32(2)).unwrap();

    v_dict([
        ("flag", v_bool(true)),
        ("big", v_uint64(u64::MAX)),
        ("neg", v_int64(-9)),
        ("ratio", v_float(0.1)),
        ("when", v_date_time(t)),
        ("span", v_time(temporal::parse_time("-00:00:01.5").unwrap())),
        ("blob", Variant::from(Buffer::from_slice(&[0, 1, 254, 255]))),
        ("nothing", v_none()),
        ("opaque", Variant::mk_any("raw")),
        ("items", v_list(&[v_str("a & b"), v_list(&[])])),
        ("pairs", v_bag([("k", v_int32(1)), ("k", v_str("<two>"))])),
        (
            "tuple",
            Variant::from(Tuple::from_values(vec![v_none(), v_double(3.25)])),
        ),
        (
            "array",
            Variant::from(TypedArray::new(2, VariantType::Int32).unwrap()),
        ),
        ("series", series),
    ])
}

#[test_case(XmlMode::default(); "compact")]
#[test_case(XmlMode { indent: true, no_header: true, ..Default::default() }; "indented")]
fn test_round_trip_preserves_value(mode: XmlMode) {
    let v = sample();
    assert_eq!(round_trip(&v, &mode), v);
}

#[test]
fn test_data_table_round_trip() {
    let mut table = DataTable::new();
    table
        .add_column(VariantType::String, Some("city"))
        .unwrap()
        .add_column(VariantType::Double, None)
        .unwrap();
    table.push_row(vec![v_str("Oslo"), v_double(-3.5)]).unwrap();
    table.push_row(vec![v_str(""), v_double(12.0)]).unwrap();
    let v = Variant::from(table);

    let back = round_trip(&v, &XmlMode::default());
    assert_eq!(back, v);
    assert_eq!(back.as_data_table().unwrap().columns()[1].name(), "Column1");
}

#[test]
fn test_exception_round_trip() {
    let v = Variant::mk_exception(
        ExceptionInfo::new("IOError", "disk full")
            .with_source("save")
            .with_stack("a\nb"),
    );
    assert_eq!(round_trip(&v, &XmlMode::default()), v);
}

#[test]
fn test_objects_through_factory_or_proxy() {
    let v = v_list(&[Variant::mk_object(Gauge { level: 0.75 })]);
    let xml = to_xml(&v, &XmlMode::default()).unwrap();
    let root = parse_document(xml.as_bytes()).unwrap();

    let proxied = XmlReader::new(XmlMode::default()).read(&root).unwrap();
    let handle = proxied.at(0).unwrap().as_object().unwrap();
    assert!(handle.is_proxy());
    assert_eq!(handle.coerce::<Gauge>().unwrap(), Gauge { level: 0.75 });
    assert_eq!(proxied, v);

    let mut registry = ObjectRegistry::new();
    registry.register::<Gauge>();
    let concrete = XmlReader::new(XmlMode::default())
        .with_factory(&registry)
        .read(&root)
        .unwrap();
    let handle = concrete.at(0).unwrap().as_object().unwrap();
    assert_eq!(handle.downcast_ref::<Gauge>(), Some(&Gauge { level: 0.75 }));
}

#[test]
fn test_list_tuple_and_table_stay_distinct() {
    let list = v_list(&[v_int32(1)]);
    let tuple = Variant::from(Tuple::from_values(vec![v_int32(1)]));
    let mode = XmlMode::default();
    assert_eq!(round_trip(&list, &mode).variant_type(), VariantType::List);
    assert_eq!(round_trip(&tuple, &mode).variant_type(), VariantType::Tuple);
    assert_eq!(
        round_trip(&Variant::from(DataTable::new()), &mode).variant_type(),
        VariantType::DataTable
    );
}

#[test_case(false; "compact")]
#[test_case(true; "indented")]
fn test_preserved_comments_and_instructions_round_trip(indent: bool) {
    let mode = XmlMode {
        preserve: true,
        indent,
        ..Default::default()
    };
    let doc = r#"<config><!--generated--><?render mode="fast"?><name>gateway</name><!--tail--></config>"#;
    let v = from_xml(doc, &mode).unwrap();
    assert_eq!(v.len(), 4);
    assert_eq!(v.range(protean_xml::COMMENT_KEY).unwrap().len(), 2);

    let back = round_trip(&v, &mode);
    assert_eq!(back, v);
    assert_eq!(
        back.at_key(protean_xml::INSTRUCTION_KEY)
            .unwrap()
            .at_key(protean_xml::DATA_KEY)
            .unwrap(),
        &Variant::mk_any(r#"mode="fast""#)
    );
}
