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

//! User-defined objects carried inside variants.
//!
//! An object persists itself by "deflating" to a parameter variant and restores itself by
//! "inflating" from one. Anything that crosses a codec boundary travels in that form, so a
//! reader that does not know a class can still keep it intact as a `ProxyObject`.

use crate::{Error, Variant, error::ErrorCode::CoercionError};
use ahash::AHashMap;
use std::{
    any::Any,
    cmp::Ordering,
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};
use tracing::{debug, warn};

pub trait Object: Debug + Send + Sync {
    /// The class name. Stable across processes; used to find a constructor on read.
    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Capture this object's state as a parameter variant.
    fn deflate(&self) -> Variant;

    /// Restore state from parameters written by (possibly another version of) this class.
    fn inflate(&mut self, params: &Variant, version: u32) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;

    /// Orders by class name, then by deflated parameters.
    fn compare(&self, other: &dyn Object) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.deflate().cmp(&other.deflate()))
    }
}

/// A shared, reference-counted object.
#[derive(Clone)]
pub struct ObjectHandle(Arc<dyn Object>);

impl ObjectHandle {
    pub fn new<T: Object + 'static>(object: T) -> Self {
        ObjectHandle(Arc::new(object))
    }

    pub fn from_boxed(object: Box<dyn Object>) -> Self {
        ObjectHandle(Arc::from(object))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn version(&self) -> u32 {
        self.0.version()
    }

    pub fn deflate(&self) -> Variant {
        self.0.deflate()
    }

    pub fn object(&self) -> &dyn Object {
        self.0.as_ref()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is_proxy(&self) -> bool {
        self.downcast_ref::<ProxyObject>().is_some()
    }

    /// Rebuild this object as a concrete `T` by deflating it and inflating a fresh `T`.
    /// Fails unless both have the same class name.
    pub fn coerce<T: Object + Default>(&self) -> Result<T, Error> {
        let mut target = T::default();
        if target.name() != self.name() {
            return Err(CoercionError.with_msg(|| {
                format!(
                    "Cannot coerce object of class '{}' into '{}'",
                    self.name(),
                    target.name()
                )
            }));
        }
        target.inflate(&self.deflate(), self.version())?;
        Ok(target)
    }

    /// Rebuild an object read back from a codec. `factory` supplies the concrete class when it
    /// knows `name`; otherwise the object is kept as a `ProxyObject`.
    pub fn restore(
        factory: Option<&dyn ObjectFactory>,
        name: &str,
        version: u32,
        params: Variant,
    ) -> Result<Self, Error> {
        let Some(factory) = factory else {
            return Ok(Self::new(ProxyObject::new(name, version, params)));
        };
        match factory.create(name, version) {
            Some(mut object) => {
                object.inflate(&params, version)?;
                Ok(Self::from_boxed(object))
            }
            None => {
                warn!(class = %name, version, "No constructor for object class; keeping a proxy");
                Ok(Self::new(ProxyObject::new(name, version, params)))
            }
        }
    }

    pub fn shares_storage(&self, other: &ObjectHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for ObjectHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for ObjectHandle {}

impl PartialOrd for ObjectHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.compare(other.0.as_ref())
    }
}

impl Hash for ObjectHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.deflate().hash(state);
    }
}

/// Stand-in for an object whose class is not known to the reader. Keeps everything needed to
/// write it back out unchanged or coerce it later.
#[derive(Clone, Debug, Default)]
pub struct ProxyObject {
    name: String,
    version: u32,
    params: Variant,
}

impl ProxyObject {
    pub fn new(name: &str, version: u32, params: Variant) -> Self {
        Self {
            name: name.to_string(),
            version,
            params,
        }
    }

    pub fn params(&self) -> &Variant {
        &self.params
    }
}

impl Object for ProxyObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn deflate(&self) -> Variant {
        self.params.clone()
    }

    fn inflate(&mut self, params: &Variant, version: u32) -> Result<(), Error> {
        self.params = params.clone();
        self.version = version;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Produces empty instances of known classes for the readers to inflate.
pub trait ObjectFactory {
    fn create(&self, name: &str, version: u32) -> Option<Box<dyn Object>>;
}

type Constructor = Box<dyn Fn() -> Box<dyn Object> + Send + Sync>;

/// An `ObjectFactory` keyed by class name.
#[derive(Default)]
pub struct ObjectRegistry {
    constructors: AHashMap<String, Constructor>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under the name its default instance reports.
    pub fn register<T: Object + Default + 'static>(&mut self) -> &mut Self {
        let name = T::default().name().to_string();
        debug!(class = %name, "Registering object class");
        self.constructors
            .insert(name, Box::new(|| Box::new(T::default()) as Box<dyn Object>));
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl ObjectFactory for ObjectRegistry {
    fn create(&self, name: &str, _version: u32) -> Option<Box<dyn Object>> {
        self.constructors.get(name).map(|ctor| ctor())
    }
}

impl Debug for ObjectRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{Dictionary, ErrorCode::TypeError, Mapping, v_dict, v_int32, v_str};

    #[derive(Clone, Debug, Default, PartialEq)]
    pub(crate) struct Point {
        pub x: i32,
        pub y: i32,
    }

    impl Object for Point {
        fn name(&self) -> &str {
            "Point"
        }

        fn version(&self) -> u32 {
            2
        }

        fn deflate(&self) -> Variant {
            v_dict([("x", v_int32(self.x)), ("y", v_int32(self.y))])
        }

        fn inflate(&mut self, params: &Variant, _version: u32) -> Result<(), Error> {
            self.x = params.at_key("x")?.as_type()?;
            self.y = params.at_key("y")?.as_type()?;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_object_compare_names_then_params() {
        let a = ObjectHandle::new(Point { x: 1, y: 2 });
        let b = ObjectHandle::new(Point { x: 1, y: 3 });
        let p = ObjectHandle::new(ProxyObject::new("Point", 2, a.deflate()));
        let other = ObjectHandle::new(ProxyObject::new("Apple", 1, a.deflate()));
        assert!(a < b);
        assert_eq!(a, p);
        assert!(other < a);
    }

    #[test]
    fn test_proxy_coerces_to_concrete() {
        let proxy = ObjectHandle::new(ProxyObject::new(
            "Point",
            2,
            v_dict([("x", v_int32(4)), ("y", v_int32(5))]),
        ));
        assert!(proxy.is_proxy());
        let point: Point = proxy.coerce().unwrap();
        assert_eq!(point, Point { x: 4, y: 5 });

        let wrong = ObjectHandle::new(ProxyObject::new("Circle", 1, v_str("r")));
        assert_eq!(wrong.coerce::<Point>().unwrap_err().code, CoercionError);
    }

    #[test]
    fn test_registry_creates_known_classes() {
        let mut registry = ObjectRegistry::new();
        registry.register::<Point>();
        assert!(registry.is_registered("Point"));
        let mut created = registry.create("Point", 2).unwrap();
        let mut params = Dictionary::new();
        params.insert("x", v_int32(9)).unwrap();
        params.insert("y", v_int32(8)).unwrap();
        created.inflate(&Variant::from(params), 2).unwrap();
        let handle = ObjectHandle::from_boxed(created);
        assert_eq!(handle.downcast_ref::<Point>(), Some(&Point { x: 9, y: 8 }));
        assert!(registry.create("Circle", 1).is_none());
    }

    #[test]
    fn test_restore_prefers_factory_then_proxy() {
        let mut registry = ObjectRegistry::new();
        registry.register::<Point>();
        let params = v_dict([("x", v_int32(1)), ("y", v_int32(2))]);

        let o = ObjectHandle::restore(Some(&registry), "Point", 2, params.clone()).unwrap();
        assert_eq!(o.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));

        let o = ObjectHandle::restore(None, "Point", 2, params.clone()).unwrap();
        assert!(o.is_proxy());

        let o = ObjectHandle::restore(Some(&registry), "Circle", 1, params).unwrap();
        assert!(o.is_proxy());
        assert_eq!(o.name(), "Circle");

        let bad = ObjectHandle::restore(Some(&registry), "Point", 2, v_str("nope"));
        assert_eq!(bad.unwrap_err().code, TypeError);
    }
}
