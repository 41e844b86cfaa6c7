mod selection_properties;
