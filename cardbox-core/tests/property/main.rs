mod derivation_properties;
