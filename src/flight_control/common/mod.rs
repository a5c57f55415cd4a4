pub(crate) mod vec3;
