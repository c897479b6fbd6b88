mod recognition_test;
