mod setops_properties;
